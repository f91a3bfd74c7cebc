mod advisory;
mod coordinator;
mod session;
mod util;
