//! Chrome DevTools Protocol renderer for flowscribe.
//!
//! Attaches to a browser started with remote debugging and drives the
//! workflow editor tab through it:
//!
//! ```bash
//! chrome --remote-debugging-port=9222
//! ```
//!
//! ```rust,ignore
//! let renderer = CdpRenderer::connect(&config.renderer).await?;
//! renderer.navigate("https://editor.example/app").await?;
//! ```

mod client;
mod error;
mod page;
mod protocol;
mod renderer;
mod transport;

pub use client::CdpClient;
pub use error::CdpError;
pub use page::PageSession;
pub use protocol::{BoxModel, BrowserVersion, PageInfo, quad_bounds};
pub use renderer::CdpRenderer;
