//! Built-in outlet hooks.

use overture_core::hooks::{OutletHook, ResponseProcessor};

/// Outlet that re-frames the fragment stream on line boundaries.
///
/// Providers emit token-sized fragments; consumers that render line by line
/// (log sinks, diff viewers) want whole lines. Buffers until a newline and
/// emits complete lines only; finalization flushes the remainder.
#[derive(Debug, Default, Clone)]
pub struct LineBufferedOutlet;

impl LineBufferedOutlet {
    pub fn new() -> Self {
        Self
    }
}

impl OutletHook for LineBufferedOutlet {
    fn processor(&self) -> Box<dyn ResponseProcessor> {
        Box::new(LineBuffered::default())
    }
}

#[derive(Default)]
struct LineBuffered {
    buf: String,
}

impl ResponseProcessor for LineBuffered {
    fn process(&mut self, fragment: &str) -> Vec<String> {
        self.buf.push_str(fragment);
        let mut out = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let rest = self.buf.split_off(pos + 1);
            let mut line = std::mem::replace(&mut self.buf, rest);
            line.pop();
            out.push(line);
        }
        out
    }

    fn finish(&mut self) -> Vec<String> {
        if self.buf.is_empty() {
            Vec::new()
        } else {
            vec![std::mem::take(&mut self.buf)]
        }
    }
}

/// Outlet that wraps the whole response in a fixed prefix and suffix.
#[derive(Debug, Clone)]
pub struct EnvelopeOutlet {
    prefix: String,
    suffix: String,
}

impl EnvelopeOutlet {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

impl OutletHook for EnvelopeOutlet {
    fn processor(&self) -> Box<dyn ResponseProcessor> {
        Box::new(Envelope {
            prefix: Some(self.prefix.clone()),
            suffix: self.suffix.clone(),
        })
    }
}

struct Envelope {
    prefix: Option<String>,
    suffix: String,
}

impl ResponseProcessor for Envelope {
    fn process(&mut self, fragment: &str) -> Vec<String> {
        match self.prefix.take() {
            Some(prefix) => vec![prefix, fragment.to_string()],
            None => vec![fragment.to_string()],
        }
    }

    fn finish(&mut self) -> Vec<String> {
        // An empty response still gets its envelope.
        match self.prefix.take() {
            Some(prefix) => vec![prefix, self.suffix.clone()],
            None => vec![self.suffix.clone()],
        }
    }
}
