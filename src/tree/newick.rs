use super::{NodeId, Tree};
use crate::error::{DecorateError, Result};
use crate::utils::input::open_text_reader;
use std::io::BufRead;
use std::path::Path;

/// Reads a Newick file (optionally compressed). Lines before the first line
/// starting with `(` are dropped, which removes the log headers some tree
/// builders prepend.
pub fn load_newick_file(path: &Path) -> Result<Tree> {
    let reader = open_text_reader(path)?;
    let mut lines = Vec::new();
    let mut found_start = false;
    let mut all_lines = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| DecorateError::io(path, e))?;
        let line = line.trim().to_string();
        if line.starts_with('(') {
            found_start = true;
        }
        if found_start {
            lines.push(line.clone());
        }
        all_lines.push(line);
    }

    // A single-leaf tree has no parentheses at all.
    let text = if found_start {
        lines.concat()
    } else {
        all_lines.concat()
    };
    parse_newick(&text)
}

/// Parses a rooted Newick string into a tree.
pub fn parse_newick(text: &str) -> Result<Tree> {
    Parser { text, pos: 0 }.parse()
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> DecorateError {
        DecorateError::Newick {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn parse(&mut self) -> Result<Tree> {
        let mut tree: Option<Tree> = None;
        let mut open: Vec<NodeId> = Vec::new();
        // Most recently completed node; labels and lengths attach to it.
        let mut current: Option<NodeId> = None;

        loop {
            self.skip_whitespace_and_comments()?;
            let byte = self
                .peek()
                .ok_or_else(|| self.error("unexpected end of input, missing ';'"))?;

            match byte {
                b'(' => {
                    if current.is_some() {
                        return Err(self.error("unexpected '('"));
                    }
                    let id = match (tree.as_mut(), open.last()) {
                        (None, _) => {
                            tree = Some(Tree::new());
                            NodeId(0)
                        }
                        (Some(t), Some(parent)) => t.add_internal(*parent),
                        (Some(_), None) => {
                            return Err(self.error("content after the root subtree"))
                        }
                    };
                    open.push(id);
                    self.pos += 1;
                }
                b',' => {
                    if open.is_empty() {
                        return Err(self.error("',' outside of parentheses"));
                    }
                    if current.is_none() {
                        return Err(self.error("empty subtree"));
                    }
                    current = None;
                    self.pos += 1;
                }
                b')' => {
                    let id = open.pop().ok_or_else(|| self.error("unbalanced ')'"))?;
                    if current.is_none() {
                        return Err(self.error("empty subtree"));
                    }
                    current = Some(id);
                    self.pos += 1;
                }
                b':' => {
                    self.pos += 1;
                    let id = current.ok_or_else(|| self.error("branch length without a node"))?;
                    let length = self.read_number()?;
                    if let Some(t) = tree.as_mut() {
                        t.node_mut(id).edge_length = Some(length);
                    }
                }
                b';' => {
                    if !open.is_empty() {
                        return Err(self.error("unbalanced '('"));
                    }
                    return tree.ok_or_else(|| self.error("empty tree"));
                }
                _ => {
                    let start = self.pos;
                    let label = self.read_label()?;
                    match current {
                        Some(id) => {
                            let t = tree.as_mut().ok_or_else(|| self.error("label without a node"))?;
                            let node = t.node_mut(id);
                            if node.is_leaf() || node.label.is_some() {
                                self.pos = start;
                                return Err(self.error(format!("unexpected label '{}'", label)));
                            }
                            node.label = Some(label);
                        }
                        None => {
                            if label.is_empty() {
                                self.pos = start;
                                return Err(self.error("unnamed leaf"));
                            }
                            let id = match (tree.as_mut(), open.last()) {
                                (None, _) => {
                                    tree = Some(Tree::single_leaf(label));
                                    NodeId(0)
                                }
                                (Some(t), Some(parent)) => t.add_leaf(*parent, label),
                                (Some(_), None) => {
                                    return Err(self.error("content after the root subtree"))
                                }
                            };
                            current = Some(id);
                        }
                    }
                }
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else if byte == b'[' {
                let end = self.text[self.pos..]
                    .find(']')
                    .ok_or_else(|| self.error("unterminated comment"))?;
                self.pos += end + 1;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn read_label(&mut self) -> Result<String> {
        if self.peek() == Some(b'\'') {
            return self.read_quoted();
        }
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if is_delimiter(byte) {
                break;
            }
            self.pos += 1;
        }
        Ok(self.text[start..self.pos].to_string())
    }

    fn read_quoted(&mut self) -> Result<String> {
        let open_pos = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let rest = &self.text[self.pos..];
            let end = rest.find('\'').ok_or_else(|| DecorateError::Newick {
                position: open_pos,
                message: "unterminated quoted label".to_string(),
            })?;
            out.push_str(&rest[..end]);
            self.pos += end + 1;
            // '' inside a quoted label is an escaped quote
            if self.peek() == Some(b'\'') {
                out.push('\'');
                self.pos += 1;
            } else {
                return Ok(out);
            }
        }
    }

    fn read_number(&mut self) -> Result<f64> {
        self.skip_whitespace_and_comments()?;
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if is_delimiter(byte) {
                break;
            }
            self.pos += 1;
        }
        let raw = &self.text[start..self.pos];
        raw.parse::<f64>().map_err(|_| DecorateError::Newick {
            position: start,
            message: format!("invalid branch length '{}'", raw),
        })
    }
}

fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b',' | b':' | b';' | b'[' | b'\'') || byte.is_ascii_whitespace()
}

/// The parts of an internal node label such as `100.0:p__Bacillota; c__Bacilli|extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLabel {
    pub support: Option<f64>,
    pub taxon: Option<String>,
    pub auxiliary: Option<String>,
}

pub fn parse_label(label: &str) -> NodeLabel {
    let mut out = NodeLabel::default();
    let mut label = label.trim();
    if label.is_empty() {
        return out;
    }

    if let Some((head, aux)) = label.split_once('|') {
        out.auxiliary = Some(aux.to_string());
        label = head;
    }

    if let Some((support, taxon)) = label.split_once(':') {
        out.support = support.trim().parse::<f64>().ok();
        out.taxon = Some(taxon.trim().to_string()).filter(|t| !t.is_empty());
    } else if let Ok(support) = label.parse::<f64>() {
        out.support = Some(support);
    } else if !label.is_empty() {
        out.taxon = Some(label.to_string());
    }
    out
}

/// The support value of a label as it was written, e.g. `100.0` in
/// `100.0:p__Bacillota`.
pub fn support_token(label: &str) -> Option<&str> {
    let label = label.trim();
    let head = label.split_once('|').map_or(label, |(head, _)| head);
    let token = head.split_once(':').map_or(head, |(support, _)| support).trim();
    token.parse::<f64>().ok().map(|_| token)
}

/// How internal node labels are written back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// Internal labels exactly as read.
    Verbatim,
    /// Only the support value of each internal label; taxonomy is dropped.
    SupportOnly,
}

enum Step {
    Open(NodeId),
    Comma,
    Close(NodeId),
}

pub fn write_newick(tree: &Tree, style: LabelStyle) -> String {
    let mut out = String::new();
    let mut stack = vec![Step::Open(tree.root())];

    while let Some(step) = stack.pop() {
        match step {
            Step::Open(id) => {
                let node = tree.node(id);
                if node.is_leaf() {
                    if let Some(genome_id) = node.genome_id() {
                        out.push_str(&quote_label(genome_id));
                    }
                    push_edge_length(&mut out, node.edge_length());
                } else {
                    out.push('(');
                    stack.push(Step::Close(id));
                    for (i, child) in node.children().iter().enumerate().rev() {
                        stack.push(Step::Open(*child));
                        if i > 0 {
                            stack.push(Step::Comma);
                        }
                    }
                }
            }
            Step::Comma => out.push(','),
            Step::Close(id) => {
                out.push(')');
                let node = tree.node(id);
                if let Some(label) = node.label() {
                    let label = match style {
                        LabelStyle::Verbatim => Some(label.to_string()),
                        LabelStyle::SupportOnly => support_token(label).map(str::to_string),
                    };
                    if let Some(label) = label {
                        out.push_str(&quote_label(&label));
                    }
                }
                push_edge_length(&mut out, node.edge_length());
            }
        }
    }

    out.push(';');
    out
}

fn push_edge_length(out: &mut String, length: Option<f64>) {
    if let Some(length) = length {
        out.push(':');
        out.push_str(&length.to_string());
    }
}

fn quote_label(label: &str) -> String {
    if label.bytes().any(is_delimiter) || label.contains(']') {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
