// Wire types exchanged between the front end, the proxy, and upstream APIs.

pub mod gemini;
pub mod proxy;
