//! Data Transfer Objects for REST request/response serialization.

pub mod bonus_dto;
pub mod common_dto;
pub mod subscriber_dto;
pub mod war_dto;

pub use bonus_dto::*;
pub use common_dto::*;
pub use subscriber_dto::*;
pub use war_dto::*;
