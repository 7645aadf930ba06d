//! Giveaway winner picker
//!
//! Pulls the commenters of an Instagram post through a cookie-authenticated
//! session and draws random winners among those with enough comments.

pub mod aggregation;
pub mod config;
pub mod error;
pub mod janitor;
pub mod models;
pub mod retriever;
pub mod selector;
pub mod service;
pub mod session;
pub mod shortcode;

pub use config::GiveawayConfig;
pub use error::{GiveawayError, GiveawayResult};
pub use janitor::SessionJanitor;
pub use models::{
    CommentSummary, CommentUser, LoginRequest, LoginResponse, PickWinnersRequest,
    PickWinnersResponse, RawComment, ValidateSessionResponse,
};
pub use retriever::{CommentRetriever, FetchSettings};
pub use service::GiveawayService;
pub use session::SessionStore;
