//! Data model: status records, message headers, and per-action wire
//! types.

pub mod common;
pub mod link;
pub mod message;
pub mod resolve;
pub mod update;

pub use common::{
    Ack, AdditionalInfo, CommonResponse, CommonResponseError, CommonResponseMessage, MapperAction,
    MapperValue, RequestStatus, SingleTxnRefStatus, TxnStatus,
};
pub use link::{
    LinkCallbackHttpRequest, LinkCallbackRequest, LinkHttpRequest, LinkRequest,
    LinkStatusReasonCode, SingleLinkCallbackRequest, SingleLinkRequest,
};
pub use message::{MsgCallbackHeader, MsgHeader, PROTOCOL_VERSION};
pub use resolve::{
    ResolveCallbackHttpRequest, ResolveCallbackRequest, ResolveHttpRequest, ResolveRequest,
    ResolveScope, ResolveStatusReasonCode, SingleResolveCallbackRequest, SingleResolveRequest,
};
pub use update::{
    SingleUpdateCallbackRequest, SingleUpdateRequest, UpdateCallbackHttpRequest,
    UpdateCallbackRequest, UpdateHttpRequest, UpdateRequest, UpdateStatusReasonCode,
};
