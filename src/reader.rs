use crate::atoms::sym;
use crate::error::{LispError, LispResult};
use crate::eval::Machine;
use crate::value::Value;

/// Reader: parses source text into cells in a machine's arena.
///
/// Input is held as code points. Every partially built list is pinned
/// while its tail is read, so the arena may collect mid-parse.
pub struct Reader {
    input: Vec<char>,
    pos: usize,
}

fn is_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\n' || ch == '\r'
}

fn is_delimiter(ch: char) -> bool {
    is_whitespace(ch) || ch == '(' || ch == ')'
}

impl Reader {
    pub fn new(input: &str) -> Self {
        Reader {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Read one expression. Returns None at end of input.
    pub fn read(&mut self, machine: &mut Machine) -> LispResult<Option<Value>> {
        if self.at_end() {
            return Ok(None);
        }
        self.read_expr(machine).map(Some)
    }

    /// True if only whitespace remains.
    pub fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.input.len()
    }

    /// Return current position in input, in code points.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, msg: &str) -> LispError {
        LispError::Parse(format!("{} at offset {}", msg, self.pos))
    }

    fn read_expr(&mut self, machine: &mut Machine) -> LispResult<Value> {
        self.skip_whitespace();

        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('(') => {
                self.advance();
                self.read_list_tail(machine)
            }
            Some(')') => Err(self.error("unexpected ')'")),
            Some('.') => Err(self.error("unexpected '.'")),
            Some('\'') => self.read_quote(machine),
            Some(_) => Ok(self.read_atom(machine)),
        }
    }

    /// Read the rest of a list after its '(' or after an element:
    /// `b c)` or `. b)` or `)`.
    fn read_list_tail(&mut self, machine: &mut Machine) -> LispResult<Value> {
        self.skip_whitespace();
        match self.peek() {
            None => return Err(self.error("unterminated list")),
            Some(')') => {
                self.advance();
                return Ok(Value::Nil);
            }
            _ => {}
        }

        let head = self.read_expr(machine)?;
        let mut pinned = machine.pin(head);

        self.skip_whitespace();
        let tail = if self.peek() == Some('.') {
            self.advance(); // consume '.'
            let tail = self.read_expr(&mut pinned)?;
            self.skip_whitespace();
            if self.peek() != Some(')') {
                return Err(self.error("expected ')' after dotted tail"));
            }
            self.advance();
            tail
        } else {
            self.read_list_tail(&mut pinned)?
        };
        drop(pinned);

        machine.heap.cons(head, tail)
    }

    /// Read quote: 'expr -> (quote expr)
    fn read_quote(&mut self, machine: &mut Machine) -> LispResult<Value> {
        self.advance(); // consume '\''
        let expr = self.read_expr(machine)?;
        let inner = machine.heap.cons(expr, Value::Nil)?;
        machine.heap.cons(Value::Atom(sym::QUOTE), inner)
    }

    fn read_atom(&mut self, machine: &mut Machine) -> Value {
        let start = self.pos;
        while self.peek().is_some_and(|ch| !is_delimiter(ch)) {
            self.pos += 1;
        }
        let name: String = self.input[start..self.pos].iter().collect();
        machine.intern(&name)
    }
}
