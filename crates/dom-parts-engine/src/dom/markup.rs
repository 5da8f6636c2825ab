//! Markup parsing and serialization for fixture documents.
//!
//! A strict, single-pass parser for an HTML-like fragment syntax: elements
//! with quoted attributes, text with entity decoding, `<!-- -->` comments and
//! `<?...?>` bogus-comment forms. The latter become comment nodes whose data
//! keeps the question marks (`<?node-part?>` parses to a comment reading
//! `?node-part?`), matching how HTML treats the original part-marker
//! fixtures. Unlike HTML this parser rejects mismatched or unclosed tags.

use thiserror::Error;

use super::{Document, NodeId, NodeKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unexpected end of input at byte {at}")]
    UnexpectedEof { at: usize },
    #[error("malformed tag at byte {at}")]
    MalformedTag { at: usize },
    #[error("closing tag </{found}> at byte {at} does not match open <{expected}>")]
    MismatchedClose {
        expected: String,
        found: String,
        at: usize,
    },
    #[error("closing tag </{found}> at byte {at} has no matching open tag")]
    StrayClose { found: String, at: usize },
    #[error("element <{name}> was never closed")]
    UnclosedElement { name: String },
}

impl Document {
    /// Parse `markup` into a fresh document under its fragment root.
    pub fn from_markup(markup: &str) -> Result<Document, MarkupError> {
        let mut doc = Document::new();
        let root = doc.root();
        doc.parse_into(root, markup)?;
        Ok(doc)
    }

    /// Parse `markup` and append the resulting nodes to `parent`.
    pub fn parse_into(&mut self, parent: NodeId, markup: &str) -> Result<(), MarkupError> {
        let s = markup;
        let bytes = s.as_bytes();
        let len = s.len();
        // Stack of open elements; the insertion point is the innermost one.
        let mut stack: Vec<(NodeId, String)> = Vec::new();
        let mut cur = parent;
        let mut i = 0;

        while i < len {
            if bytes[i] != b'<' {
                let end = s[i..].find('<').map(|o| i + o).unwrap_or(len);
                let text = html_escape::decode_html_entities(&s[i..end]);
                let t = self.create_text(&text);
                self.append_child(cur, t);
                i = end;
            } else if s[i..].starts_with("<!--") {
                let start = i + 4;
                let end = s[start..]
                    .find("-->")
                    .map(|o| start + o)
                    .ok_or(MarkupError::UnexpectedEof { at: i })?;
                let c = self.create_comment(&s[start..end]);
                self.append_child(cur, c);
                i = end + 3;
            } else if s[i..].starts_with("<?") {
                // Bogus comment: everything after `<` up to `>` is the data.
                let end = s[i..]
                    .find('>')
                    .map(|o| i + o)
                    .ok_or(MarkupError::UnexpectedEof { at: i })?;
                let c = self.create_comment(&s[i + 1..end]);
                self.append_child(cur, c);
                i = end + 1;
            } else if s[i..].starts_with("</") {
                let start = i + 2;
                let end = s[start..]
                    .find('>')
                    .map(|o| start + o)
                    .ok_or(MarkupError::UnexpectedEof { at: i })?;
                let found = s[start..end].trim().to_string();
                match stack.pop() {
                    None => return Err(MarkupError::StrayClose { found, at: i }),
                    Some((_, name)) if name != found => {
                        return Err(MarkupError::MismatchedClose {
                            expected: name,
                            found,
                            at: i,
                        });
                    }
                    Some(_) => {}
                }
                cur = stack.last().map(|f| f.0).unwrap_or(parent);
                i = end + 1;
            } else {
                i = self.parse_tag(s, i, &mut stack, &mut cur, parent)?;
            }
        }

        if let Some((_, name)) = stack.pop() {
            return Err(MarkupError::UnclosedElement { name });
        }
        Ok(())
    }

    fn parse_tag(
        &mut self,
        s: &str,
        i: usize,
        stack: &mut Vec<(NodeId, String)>,
        cur: &mut NodeId,
        parent: NodeId,
    ) -> Result<usize, MarkupError> {
        let bytes = s.as_bytes();
        let len = s.len();
        let start = i + 1;
        let mut j = start;
        while j < len && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'-') {
            j += 1;
        }
        if j == start || !bytes[start].is_ascii_alphabetic() {
            return Err(MarkupError::MalformedTag { at: i });
        }
        let name = &s[start..j];
        let el = self.create_element(name);
        self.append_child(*cur, el);

        loop {
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j >= len {
                return Err(MarkupError::UnexpectedEof { at: i });
            }
            if bytes[j] == b'>' {
                stack.push((el, name.to_string()));
                *cur = el;
                return Ok(j + 1);
            }
            if bytes[j] == b'/' {
                if s[j..].starts_with("/>") {
                    return Ok(j + 2);
                }
                return Err(MarkupError::MalformedTag { at: j });
            }

            let an = j;
            while j < len
                && (bytes[j].is_ascii_alphanumeric()
                    || bytes[j] == b'-'
                    || bytes[j] == b'_'
                    || bytes[j] == b':')
            {
                j += 1;
            }
            if j == an {
                return Err(MarkupError::MalformedTag { at: j });
            }
            let attr_name = s[an..j].to_string();
            let mut attr_value = String::new();
            if j < len && bytes[j] == b'=' {
                j += 1;
                if j >= len {
                    return Err(MarkupError::UnexpectedEof { at: an });
                }
                let quote = bytes[j];
                if quote != b'"' && quote != b'\'' {
                    return Err(MarkupError::MalformedTag { at: j });
                }
                j += 1;
                let vstart = j;
                while j < len && bytes[j] != quote {
                    j += 1;
                }
                if j >= len {
                    return Err(MarkupError::UnexpectedEof { at: vstart });
                }
                attr_value = html_escape::decode_html_entities(&s[vstart..j]).into_owned();
                j += 1;
            }
            self.nodes[el.index()].attrs.push((attr_name, attr_value));
        }
    }

    /// Serialize the subtree at `root` back to markup. Fragments emit their
    /// children only; comments always use the `<!-- -->` form.
    pub fn to_markup(&self, root: NodeId) -> String {
        let mut out = String::new();
        self.write_node(root, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let n = self.node(id);
        match n.kind {
            NodeKind::Fragment => {
                for c in self.children(id) {
                    self.write_node(c, out);
                }
            }
            NodeKind::Text => out.push_str(&html_escape::encode_text(&n.text)),
            NodeKind::Comment => {
                out.push_str("<!--");
                out.push_str(&n.text);
                out.push_str("-->");
            }
            NodeKind::Element => {
                out.push('<');
                out.push_str(&n.name);
                for (k, v) in &n.attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(v));
                    out.push('"');
                }
                out.push('>');
                for c in self.children(id) {
                    self.write_node(c, out);
                }
                out.push_str("</");
                out.push_str(&n.name);
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_elements_text_and_comments() {
        let doc = Document::from_markup("<div class=\"a\">Hi<!--note--></div> tail").unwrap();
        let root = doc.root();
        let kids: Vec<_> = doc.children(root).collect();
        assert_eq!(kids.len(), 2);
        let div = doc.node(kids[0]);
        assert_eq!(div.kind, NodeKind::Element);
        assert_eq!(div.name, "div");
        assert_eq!(div.attrs, vec![("class".to_string(), "a".to_string())]);
        let inner: Vec<_> = doc.children(kids[0]).collect();
        assert_eq!(doc.node(inner[0]).text, "Hi");
        assert_eq!(doc.node(inner[1]).kind, NodeKind::Comment);
        assert_eq!(doc.node(inner[1]).text, "note");
        assert_eq!(doc.node(kids[1]).text, " tail");
    }

    #[test]
    fn bogus_comment_form_keeps_question_marks() {
        let doc = Document::from_markup("<?node-part?><h1>Hello</h1>").unwrap();
        let kids: Vec<_> = doc.children(doc.root()).collect();
        let c = doc.node(kids[0]);
        assert_eq!(c.kind, NodeKind::Comment);
        assert_eq!(c.text, "?node-part?");
    }

    #[test]
    fn text_entities_are_decoded() {
        let doc = Document::from_markup("<p>a &amp; b &lt;c&gt;</p>").unwrap();
        let p = doc.children(doc.root()).next().unwrap();
        let t = doc.children(p).next().unwrap();
        assert_eq!(doc.node(t).text, "a & b <c>");
    }

    #[test]
    fn self_closing_tags_stay_empty() {
        let doc = Document::from_markup("<div><br/>x</div>").unwrap();
        let div = doc.children(doc.root()).next().unwrap();
        let kids: Vec<_> = doc.children(div).collect();
        assert_eq!(doc.node(kids[0]).name, "br");
        assert_eq!(doc.children(kids[0]).count(), 0);
        assert_eq!(doc.node(kids[1]).text, "x");
    }

    #[test]
    fn serialization_round_trips() {
        let src = "<div class=\"a\">Hi<!--?node-part?--><span>x &amp; y</span></div>";
        let doc = Document::from_markup(src).unwrap();
        let emitted = doc.to_markup(doc.root());
        assert_eq!(emitted, src);
        let again = Document::from_markup(&emitted).unwrap();
        assert_eq!(again.to_markup(again.root()), src);
    }

    #[test]
    fn mismatched_close_is_rejected() {
        let err = Document::from_markup("<div><span></div>").unwrap_err();
        assert!(matches!(err, MarkupError::MismatchedClose { .. }));
    }

    #[test]
    fn unclosed_element_is_rejected() {
        let err = Document::from_markup("<div><span>").unwrap_err();
        assert_eq!(
            err,
            MarkupError::UnclosedElement {
                name: "span".to_string()
            }
        );
    }

    #[test]
    fn stray_close_is_rejected() {
        let err = Document::from_markup("hello</div>").unwrap_err();
        assert!(matches!(err, MarkupError::StrayClose { .. }));
    }
}
