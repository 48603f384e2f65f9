//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! Parses configuration text (§6) into a delta/deletion `ConfigNode`
//! subtree: `segment [op value] { child … } ;`, with tag instances named
//! by a quoted key rather than an operator/value pair. Resolution of
//! each segment's type happens inline against the template tree, the
//! same way `ConfigTree::merge_node` resolves a delta it is handed, so
//! the two never disagree about what a given path means.

use chrono::Utc;
use routecfg_template::TemplateTree;
use routecfg_value::{Operator, TypedValue, ValueKind};

use crate::error::Error;
use crate::node::ConfigNode;

struct Cursor<'a> {
    chars: Vec<char>,
    pos: usize,
    file: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(text: &str, file: &'a str) -> Self {
        Cursor { chars: text.chars().collect(), pos: 0, file }
    }

    fn line(&self) -> u32 {
        1 + self.chars[..self.pos].iter().filter(|&&c| c == '\n').count() as u32
    }

    fn err(&self, message: impl Into<String>) -> Error {
        Error::parse(Some(self.file), Some(self.line()), message)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    // Comments (`/* ... */`) are treated as whitespace wherever they
    // appear, not just in the leading file header (§6).
    fn skip_ws(&mut self) {
        loop {
            while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
                self.pos += 1;
            }
            if self.chars.get(self.pos) == Some(&'/') && self.chars.get(self.pos + 1) == Some(&'*') {
                self.pos += 2;
                while self.pos < self.chars.len()
                    && !(self.chars[self.pos] == '*' && self.chars.get(self.pos + 1) == Some(&'/'))
                {
                    self.pos += 1;
                }
                self.pos = (self.pos + 2).min(self.chars.len());
                continue;
            }
            break;
        }
    }

    fn eof(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.chars.len()
    }

    fn expect_char(&mut self, c: char) -> Result<(), Error> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(format!("expected '{c}'")))
        }
    }

    fn eat_char(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn read_word(&mut self) -> Result<String, Error> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || "{};\"".contains(c) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err("expected a word"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn read_quoted(&mut self) -> Result<String, Error> {
        self.expect_char('"')?;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            self.pos += 1;
        }
        if self.peek() != Some('"') {
            return Err(self.err("unterminated string"));
        }
        let s: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        Ok(s)
    }

    // An operator token, if the next non-whitespace run is one of the
    // symbol sequences `Operator::from_str` understands. Returns `None`
    // (consuming nothing) when the next character cannot start one,
    // which is how a bare tag-instance key ("eth0", preceded by no
    // operator at all) is told apart from an explicit leaf assignment
    // ("mtu: 1400").
    fn try_read_operator(&mut self) -> Option<String> {
        self.skip_ws();
        const SYMBOLS: &str = ":=!<>+-*/&|^";
        let start = self.pos;
        if self.chars.get(self.pos).is_some_and(|c| *c == 'i')
            && self.chars[self.pos..].iter().take(5).collect::<String>() == "ipnet"
        {
            self.pos += 5;
        }
        while self.chars.get(self.pos).is_some_and(|c| SYMBOLS.contains(*c)) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    fn value_follows(&mut self) -> bool {
        self.skip_ws();
        !matches!(self.peek(), None | Some('{') | Some(';'))
    }

    fn read_value_text(&mut self) -> Result<String, Error> {
        self.skip_ws();
        if self.peek() == Some('"') {
            self.read_quoted()
        } else {
            self.read_word()
        }
    }
}

// Parses `text` into a synthetic-root delta/deletion tree, ready to be
// handed to `ConfigTree::merge_delta` or `ConfigTree::merge_deletion`.
// Both deltas and deletions share this grammar; it is the caller's
// choice of merge operation that decides what a terminal node means.
pub fn parse(text: &str, file: &str, template: &TemplateTree) -> Result<ConfigNode, Error> {
    let mut cursor = Cursor::new(text, file);
    let mut root = ConfigNode::new_root();
    parse_block(&mut cursor, template, &[], &mut root)?;
    Ok(root)
}

fn parse_block(
    cursor: &mut Cursor<'_>,
    template: &TemplateTree,
    path: &[String],
    parent: &mut ConfigNode,
) -> Result<(), Error> {
    loop {
        if cursor.eof() || cursor.peek() == Some('}') {
            return Ok(());
        }
        let child = parse_entry(cursor, template, path)?;
        parent.children.push(child);
    }
}

fn parse_entry(
    cursor: &mut Cursor<'_>,
    template: &TemplateTree,
    path: &[String],
) -> Result<ConfigNode, Error> {
    let word = cursor.read_word()?;

    let mut probe = path.to_vec();
    probe.push(word.clone());
    let probe_strs: Vec<&str> = probe.iter().map(String::as_str).collect();
    let tnode = template
        .find_by_path(&probe_strs)
        .ok_or_else(|| Error::UnknownPath(probe.join(".")))?;

    let operator_text = cursor.try_read_operator();
    let raw_value = if operator_text.is_some() || cursor.value_follows() {
        Some(cursor.read_value_text()?)
    } else {
        None
    };

    let (segname, child_path, value_kind) = if tnode.is_tag {
        let key_text = raw_value
            .clone()
            .ok_or_else(|| cursor.err(format!("tag '{word}' is missing its key value")))?;
        let mut child_path = path.to_vec();
        child_path.push(key_text.clone());
        let kind = tnode.find_child("@").and_then(|key| key.kind);
        (key_text, child_path, kind)
    } else {
        let mut child_path = path.to_vec();
        child_path.push(word.clone());
        (word.clone(), child_path, tnode.kind)
    };

    let now = Utc::now();
    let mut node = ConfigNode::new_child(
        segname,
        child_path.clone(),
        tnode.is_tag,
        tnode.is_value_type() || tnode.is_tag,
        0,
        0,
        now,
    );

    if let Some(text) = &raw_value {
        let kind: ValueKind = value_kind
            .ok_or_else(|| cursor.err(format!("'{word}' does not accept a value")))?;
        let value = TypedValue::parse(kind, text).map_err(|e| cursor.err(e.to_string()))?;
        node.value = Some(value);
        node.has_value = true;
        node.operator = match operator_text {
            Some(token) => token
                .parse::<Operator>()
                .map_err(|_| cursor.err(format!("unknown operator: {token}")))?,
            None => Operator::Assign,
        };
    }

    if cursor.eat_char('{') {
        parse_block(cursor, template, &child_path, &mut node)?;
        cursor.expect_char('}')?;
    }
    cursor.expect_char(';')?;

    Ok(node)
}

#[cfg(test)]
mod tests {
    use routecfg_template::{parser as tparser, TemplateNode};

    use super::*;

    fn sample_template() -> TemplateTree {
        let mut root = TemplateNode::new_void("", "");
        tparser::parse_into(
            r#"
            interfaces {
                interface @: txt {
                    mtu: u32 = 1500;
                };
            };
            "#,
            "t.tp",
            &mut root,
        )
        .unwrap();
        TemplateTree::from_parsed_root(root).unwrap()
    }

    #[test]
    fn parses_tag_instance_and_leaf() {
        let template = sample_template();
        let root = parse(
            r#"interfaces { interface "eth0" { mtu: 1400; }; };"#,
            "t.conf",
            &template,
        )
        .unwrap();

        let interfaces = &root.children[0];
        assert_eq!(interfaces.segname, "interfaces");
        let eth0 = &interfaces.children[0];
        assert_eq!(eth0.segname, "eth0");
        assert!(eth0.is_tag);
        assert_eq!(eth0.value, Some(TypedValue::Text("eth0".to_string())));
        let mtu = &eth0.children[0];
        assert_eq!(mtu.value, Some(TypedValue::UInt32(1400)));
        assert_eq!(mtu.operator, Operator::Assign);
    }

    #[test]
    fn skips_header_comment() {
        let template = sample_template();
        let text = "/* XORP configuration file\n * Configuration format: 1.1\n */\ninterfaces { interface \"eth0\" { mtu: 1400; }; };";
        let root = parse(text, "t.conf", &template).unwrap();
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn deletion_terminal_has_no_children() {
        let template = sample_template();
        let root = parse(r#"interfaces { interface "eth0"; };"#, "t.conf", &template).unwrap();
        let eth0 = &root.children[0].children[0];
        assert!(eth0.children.is_empty());
    }

    #[test]
    fn unknown_path_is_an_error() {
        let template = sample_template();
        let err = parse("bogus: 1;", "t.conf", &template).unwrap_err();
        assert!(matches!(err, Error::UnknownPath(_)));
    }
}
