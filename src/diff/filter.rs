//! Noise filter over a structural line diff.
//!
//! The live side of a comparison always carries values the platform filled
//! in (timestamps, generated identifiers, zeroed fields) that a freshly built
//! desired object leaves unset. The filter makes a single left-to-right pass
//! and keeps only the changes that matter:
//!
//! - a named field that disappears keeps its live value, unless the desired
//!   side replaces it with a non-empty value;
//! - a field that appears with a logically empty value is ignored;
//! - a named substructure that disappears entirely is ignored;
//! - a removed list element is reported, unless every live element of that
//!   list was removed and nothing was added (the list collapsed to empty).
//!
//! Malformed input (unbalanced open and close lines) yields no diff.

use std::collections::VecDeque;

use tracing::debug;

use super::line::{ChangeMarker, LineRole, StructuralLine};
use crate::value::is_logically_empty_token;

/// Filters a raw structural diff down to the changes that matter.
///
/// Returns the rendered diff, or an empty string when nothing real changed.
pub fn filter_diff(lines: &[StructuralLine]) -> String {
    let mut filter = DiffFilter::new();
    for line in lines {
        if let Err(reason) = filter.feed(line) {
            debug!(reason, "malformed structural diff, treating as unchanged");
            return String::new();
        }
    }
    filter.finish().unwrap_or_default()
}

/// One slot of a frame's pending output.
enum Slot {
    Line(String),
    /// A removed list element, held until its collection closes.
    Deferred(Vec<String>),
}

/// FIFO of removed named fields at one depth, waiting for a matching addition.
#[derive(Default)]
struct RemovalQueue<'a> {
    pending: VecDeque<&'a StructuralLine>,
}

impl<'a> RemovalQueue<'a> {
    fn push(&mut self, line: &'a StructuralLine) {
        self.pending.push_back(line);
    }

    fn pop_front(&mut self) -> Option<&'a StructuralLine> {
        self.pending.pop_front()
    }

    fn front(&self) -> Option<&'a StructuralLine> {
        self.pending.front().copied()
    }
}

/// In-progress deletion of an entire nested element.
struct StructDeletion {
    /// Depth of the removed open line.
    start_depth: usize,
    /// Current nesting depth inside the removed element.
    depth: usize,
    named: bool,
    lines: Vec<String>,
}

impl StructDeletion {
    fn start(line: &StructuralLine, start_depth: usize) -> Self {
        StructDeletion {
            start_depth,
            depth: start_depth + 1,
            named: line.is_named(),
            lines: vec![line.render(ChangeMarker::Removed, start_depth)],
        }
    }

    /// Buffers a line; returns true once the element's matching close is seen.
    fn buffer(&mut self, line: &StructuralLine) -> bool {
        match line.role {
            LineRole::Open => {
                self.lines.push(line.render(line.marker, self.depth));
                self.depth += 1;
                false
            }
            LineRole::Close => {
                self.depth -= 1;
                self.lines.push(line.render(line.marker, self.depth));
                self.depth == self.start_depth
            }
            LineRole::Plain => {
                self.lines.push(line.render(line.marker, self.depth));
                false
            }
        }
    }
}

/// One open collection.
struct Frame<'a> {
    /// The line that opened this collection; None for the root.
    open: Option<&'a StructuralLine>,
    /// Live value of the same field, superseded by an added collection.
    replaced: Option<&'a StructuralLine>,
    depth: usize,
    out: Vec<Slot>,
    queue: RemovalQueue<'a>,
    /// Live-side children seen so far.
    children: usize,
    added: usize,
    deleted_siblings: usize,
    real: bool,
}

impl<'a> Frame<'a> {
    fn new(open: Option<&'a StructuralLine>, replaced: Option<&'a StructuralLine>, depth: usize) -> Self {
        Frame {
            open,
            replaced,
            depth,
            out: Vec::new(),
            queue: RemovalQueue::default(),
            children: 0,
            added: 0,
            deleted_siblings: 0,
            real: false,
        }
    }

    fn emit(&mut self, line: &StructuralLine, marker: ChangeMarker) {
        self.out.push(Slot::Line(line.render(marker, self.depth)));
        if marker != ChangeMarker::None {
            self.real = true;
        }
    }

    /// Re-emits every queued removal as unchanged: the live value wins.
    fn drain_queue(&mut self) {
        while let Some(removed) = self.queue.pop_front() {
            self.emit(removed, ChangeMarker::None);
        }
    }

    /// Drops queued removals that do not match `line` (keeping their live
    /// values) and returns the one that does, if any.
    fn take_match(&mut self, line: &StructuralLine) -> Option<&'a StructuralLine> {
        while let Some(front) = self.queue.front() {
            self.queue.pop_front();
            if front.same_field(line) {
                return Some(front);
            }
            self.emit(front, ChangeMarker::None);
        }
        None
    }

    fn is_emptied(&self) -> bool {
        self.deleted_siblings > 0 && self.deleted_siblings == self.children && self.added == 0
    }

    /// Resolves deferred element deletions and returns the rendered lines.
    fn settle(mut self) -> (Vec<String>, bool, Option<&'a StructuralLine>, Option<&'a StructuralLine>) {
        self.drain_queue();
        let emptied = self.is_emptied();
        if emptied {
            debug!(
                removed = self.deleted_siblings,
                "collection emptied, ignoring removed elements"
            );
        }

        let mut real = self.real;
        let mut lines = Vec::with_capacity(self.out.len());
        for slot in self.out {
            match slot {
                Slot::Line(l) => lines.push(l),
                Slot::Deferred(_) if emptied => {}
                Slot::Deferred(block) => {
                    real = true;
                    lines.extend(block);
                }
            }
        }
        (lines, real, self.open, self.replaced)
    }
}

struct DiffFilter<'a> {
    frames: Vec<Frame<'a>>,
    deletion: Option<StructDeletion>,
}

impl<'a> DiffFilter<'a> {
    fn new() -> Self {
        DiffFilter {
            frames: vec![Frame::new(None, None, 0)],
            deletion: None,
        }
    }

    fn top(&mut self) -> &mut Frame<'a> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn feed(&mut self, line: &'a StructuralLine) -> Result<(), &'static str> {
        if let Some(deletion) = self.deletion.as_mut() {
            if deletion.buffer(line) {
                if let Some(done) = self.deletion.take() {
                    self.resolve_deletion(done);
                }
            }
            return Ok(());
        }

        match (line.role, line.marker) {
            (LineRole::Open, ChangeMarker::Removed) => {
                let depth = self.top().depth;
                self.top().children += 1;
                self.deletion = Some(StructDeletion::start(line, depth));
            }
            (LineRole::Open, ChangeMarker::Added) => {
                let top = self.top();
                top.added += 1;
                let replaced = top.take_match(line);
                let depth = top.depth + 1;
                self.frames.push(Frame::new(Some(line), replaced, depth));
            }
            (LineRole::Open, ChangeMarker::None) => {
                let top = self.top();
                top.drain_queue();
                top.children += 1;
                let depth = top.depth + 1;
                self.frames.push(Frame::new(Some(line), None, depth));
            }
            (LineRole::Close, _) => {
                if self.frames.len() == 1 {
                    return Err("close without matching open");
                }
                if let Some(frame) = self.frames.pop() {
                    self.close_frame(frame);
                }
            }
            (LineRole::Plain, ChangeMarker::Removed) => {
                let top = self.top();
                top.children += 1;
                if line.is_named() {
                    top.queue.push(line);
                } else {
                    top.deleted_siblings += 1;
                    let rendered = line.render(ChangeMarker::Removed, top.depth);
                    top.out.push(Slot::Deferred(vec![rendered]));
                }
            }
            (LineRole::Plain, ChangeMarker::Added) => {
                let top = self.top();
                top.added += 1;
                let replaced = top.take_match(line);
                let empty = is_logically_empty_token(&line.token);
                match (replaced, empty) {
                    (None, true) => {}
                    (None, false) => top.emit(line, ChangeMarker::Added),
                    (Some(old), false) => {
                        top.emit(old, ChangeMarker::Removed);
                        top.emit(line, ChangeMarker::Added);
                    }
                    (Some(old), true) => top.emit(old, ChangeMarker::None),
                }
            }
            (LineRole::Plain, ChangeMarker::None) => {
                let top = self.top();
                top.drain_queue();
                top.children += 1;
                top.emit(line, ChangeMarker::None);
            }
        }
        Ok(())
    }

    fn resolve_deletion(&mut self, deletion: StructDeletion) {
        if deletion.named {
            debug!("ignoring removal of named substructure");
            return;
        }
        let top = self.top();
        top.deleted_siblings += 1;
        top.out.push(Slot::Deferred(deletion.lines));
    }

    fn close_frame(&mut self, frame: Frame<'a>) {
        let (lines, real, open, replaced) = frame.settle();
        let Some(open) = open else {
            return;
        };
        let parent = self.top();
        let closing = StructuralLine::close(open.marker, closing_delimiter(&open.token));

        if open.marker == ChangeMarker::Added {
            if !real {
                // An added collection with nothing real inside is logically empty.
                if let Some(old) = replaced {
                    parent.emit(old, ChangeMarker::None);
                }
                return;
            }
            if let Some(old) = replaced {
                parent.emit(old, ChangeMarker::Removed);
            }
        }

        parent.emit(open, open.marker);
        parent.out.extend(lines.into_iter().map(Slot::Line));
        parent.emit(&closing, open.marker);
        parent.real |= real;
    }

    fn finish(mut self) -> Option<String> {
        if self.deletion.is_some() || self.frames.len() != 1 {
            debug!(
                open = self.frames.len() - 1,
                "unbalanced structural diff, treating as unchanged"
            );
            return None;
        }
        let root = self.frames.pop()?;
        let (lines, real, _, _) = root.settle();
        if !real {
            return None;
        }
        let mut out = lines.join("\n");
        out.push('\n');
        Some(out)
    }
}

fn closing_delimiter(open: &str) -> &'static str {
    match open {
        "[" => "]",
        _ => "}",
    }
}
