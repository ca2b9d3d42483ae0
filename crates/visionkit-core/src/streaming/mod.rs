mod routes;
mod server;
mod state;
mod ui;

pub use server::{router, run_dashboard_server};
pub use state::{AppState, FrameHub, JpegFrame};
