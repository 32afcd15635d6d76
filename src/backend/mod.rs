//! Backend module - Remote client contract, HTTP implementation, and wire types

pub mod http_backend;
pub mod traits;
pub mod wire;

pub use http_backend::{HttpRemoteClient, RetryPolicy};
pub use traits::{text2img_poll_path, RemoteClient, TEXT2IMG_PATH};
pub use wire::RemoteText2ImgRequest;
