use std::collections::HashMap;

use tracing::debug;

use toolindex_types::models::{Comment, CommentNode};

/// Deepest level (roots are level 0) that still accepts new replies.
pub const MAX_REPLY_DEPTH: usize = 3;

/// Anything with an id and an optional parent id can be threaded.
pub trait Threaded {
    fn id(&self) -> &str;
    fn parent_id(&self) -> Option<&str>;
}

impl Threaded for Comment {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

/// Rebuild the reply tree from comments in creation order.
///
/// Roots and each replies list keep the input order. A comment whose parent
/// is not in the batch is dropped along with its own replies. With duplicate
/// ids the last occurrence wins and earlier ones are discarded. Cycles can
/// never reach a root, so they are dropped as well.
pub fn build_tree<T: Threaded>(comments: Vec<T>) -> Vec<CommentNode<T>> {
    let count = comments.len();

    let mut index: HashMap<String, usize> = HashMap::with_capacity(count);
    for (pos, comment) in comments.iter().enumerate() {
        index.insert(comment.id().to_string(), pos);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut roots = Vec::new();
    let mut orphans = 0usize;

    for (pos, comment) in comments.iter().enumerate() {
        if index.get(comment.id()) != Some(&pos) {
            continue;
        }
        match comment.parent_id() {
            None => roots.push(pos),
            Some(parent) => match index.get(parent) {
                Some(&parent_pos) => children[parent_pos].push(pos),
                None => orphans += 1,
            },
        }
    }

    if orphans > 0 {
        debug!("Dropping {} replies whose parent is not loaded", orphans);
    }

    // Assemble bottom-up with an explicit stack so deep threads can't
    // exhaust the call stack.
    let mut slots: Vec<Option<T>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode<T>>> = (0..count).map(|_| None).collect();
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&pos| (pos, false)).collect();

    while let Some((pos, expanded)) = stack.pop() {
        if expanded {
            let replies = children[pos]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            if let Some(comment) = slots[pos].take() {
                built[pos] = Some(CommentNode { comment, replies });
            }
        } else {
            stack.push((pos, true));
            stack.extend(children[pos].iter().rev().map(|&child| (child, false)));
        }
    }

    roots.into_iter().filter_map(|pos| built[pos].take()).collect()
}

/// Depth of a comment within the batch, roots being 0. `None` when the
/// comment or one of its ancestors is missing, or the chain loops.
pub fn reply_depth<T: Threaded>(comments: &[T], id: &str) -> Option<usize> {
    let by_id: HashMap<&str, &T> = comments.iter().map(|c| (c.id(), c)).collect();

    let mut current = *by_id.get(id)?;
    let mut depth = 0;
    while let Some(parent) = current.parent_id() {
        depth += 1;
        if depth > comments.len() {
            return None;
        }
        current = *by_id.get(parent)?;
    }
    Some(depth)
}

/// Whether a comment at `depth` may receive a new reply.
pub fn can_reply(depth: usize) -> bool {
    depth < MAX_REPLY_DEPTH
}
