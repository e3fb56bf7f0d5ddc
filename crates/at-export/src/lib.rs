/// Output sinks for asciitile: plain text and standalone HTML.

pub mod html;
pub mod text;

pub use html::HtmlSink;
pub use text::TextSink;
