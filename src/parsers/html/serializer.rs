use std::io;

use encoding_rs::Encoding;
use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{RcDom, SerializableHandle};

/// 序列化文档，并按原文档编码重新编码
pub fn serialize_document(dom: RcDom, document_encoding: &str) -> io::Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = dom.document.into();
    serialize(&mut buf, &serializable, SerializeOpts::default())?;

    if !document_encoding.is_empty() {
        if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
            let s: &str = &String::from_utf8_lossy(&buf);
            let (data, _, _) = encoding.encode(s);
            buf = data.to_vec();
        }
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::html_to_dom;

    #[test]
    fn serializes_text_back_out() {
        let dom = html_to_dom(b"<html><body><p>Hello</p></body></html>", "utf-8").unwrap();
        let out = serialize_document(dom, "utf-8").unwrap();
        let html = String::from_utf8(out).unwrap();
        assert!(html.contains("<p>Hello</p>"));
    }
}
