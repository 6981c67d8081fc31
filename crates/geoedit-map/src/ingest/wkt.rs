//! Well-known text geometry reader.
//!
//! Reads the five supported geometry kinds, with optional `Z`/`M`/`ZM`
//! dimension tags (extra ordinates are dropped) and an optional EWKT
//! `SRID=...;` prefix.

use geoedit_core::{Coord, CoordinateFormatError, CoordinateTree, Geometry, GeometryKind};

/// Deepest parenthesis nesting of any supported kind (MultiPolygon is 3).
const MAX_NESTING: usize = 4;

/// Parses WKT text into a geometry.
pub fn parse_wkt(text: &str) -> Result<Geometry, CoordinateFormatError> {
    let mut body = text.trim();
    if body.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("SRID=")) {
        body = match body.find(';') {
            Some(pos) => &body[pos + 1..],
            None => return Err(invalid("SRID prefix without ';'")),
        };
    }

    let mut parser = Parser::new(body);
    let tag = parser.word();
    if tag.is_empty() {
        return Err(invalid("missing geometry type"));
    }
    let kind: GeometryKind = tag.parse().map_err(|e: String| invalid(&e))?;

    let dims = parser.word();
    let extra = match dims.to_ascii_uppercase().as_str() {
        "" => None,
        "Z" | "M" => Some(1),
        "ZM" => Some(2),
        "EMPTY" => return Err(invalid("empty geometry")),
        other => return Err(invalid(&format!("unexpected '{}'", other))),
    };
    if parser.word().eq_ignore_ascii_case("EMPTY") {
        return Err(invalid("empty geometry"));
    }

    let tree = parser.sequence(extra, 1)?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(invalid("trailing characters"));
    }

    let tree = match (kind, tree) {
        (GeometryKind::Point, CoordinateTree::Branch(mut items)) if items.len() == 1 => {
            items.remove(0)
        }
        (GeometryKind::Point, _) => return Err(invalid("a point has exactly one position")),
        (_, tree) => tree,
    };
    tree.into_geometry(kind)
}

fn invalid(reason: &str) -> CoordinateFormatError {
    CoordinateFormatError::InvalidWkt {
        reason: reason.to_string(),
    }
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), CoordinateFormatError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(invalid(&format!("expected '{}' at offset {}", c, self.pos)))
        }
    }

    /// Reads an alphabetic word, or nothing.
    fn word(&mut self) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn number(&mut self) -> Result<f64, CoordinateFormatError> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(invalid(&format!("expected a number at offset {}", self.pos)));
        }
        let value: f64 = rest[..len]
            .parse()
            .map_err(|_| invalid(&format!("bad number '{}'", &rest[..len])))?;
        if !value.is_finite() {
            return Err(invalid("non-finite number"));
        }
        self.pos += len;
        Ok(value)
    }

    /// One position: two ordinates plus any declared or undeclared extras.
    fn position(&mut self, extra: Option<usize>) -> Result<Coord, CoordinateFormatError> {
        let x = self.number()?;
        let y = self.number()?;
        match extra {
            Some(n) => {
                for _ in 0..n {
                    self.number()?;
                }
            }
            None => {
                // Untagged 3D/4D positions are tolerated.
                for _ in 0..2 {
                    self.skip_ws();
                    match self.peek() {
                        Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                            self.number()?;
                        }
                        _ => break,
                    }
                }
            }
        }
        Ok(Coord(x, y))
    }

    /// A parenthesized list of positions or of nested lists.
    fn sequence(
        &mut self,
        extra: Option<usize>,
        depth: usize,
    ) -> Result<CoordinateTree, CoordinateFormatError> {
        if depth > MAX_NESTING {
            return Err(invalid(&format!("nested deeper than {} levels", MAX_NESTING)));
        }
        self.expect('(')?;
        self.skip_ws();
        let mut items = Vec::new();
        if self.peek() == Some('(') {
            loop {
                items.push(self.sequence(extra, depth + 1)?);
                if !self.eat(',') {
                    break;
                }
            }
        } else {
            loop {
                items.push(CoordinateTree::Leaf(self.position(extra)?));
                if !self.eat(',') {
                    break;
                }
            }
        }
        self.expect(')')?;
        Ok(CoordinateTree::Branch(items))
    }
}
