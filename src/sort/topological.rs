//! Generic dependency-respecting linearization with cycle fallback
//!
//! Adjacency is computed by a caller-supplied matcher over an index of the
//! items (path match for project files, package-id match for updates), not
//! by identity equality. The raw output places a dependent before the
//! items it depends on; callers that need dependencies first reverse it.
//!
//! If any cycle is detected the sort is abandoned entirely and the input
//! order is returned unchanged. Partial sorting of the acyclic remainder
//! is deliberately not attempted; a predictable order matters more than an
//! optimal one here.

use tracing::{debug, error, info};

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Sort `items` so that each item precedes everything it depends on
///
/// `depends_on(a, b)` answers "does a depend on b"; `label` names an item
/// for logging. Returns the input order unchanged when there are no edges
/// or when a cycle is found.
pub fn sort<T>(
    items: Vec<T>,
    depends_on: impl Fn(&T, &T) -> bool,
    label: impl Fn(&T) -> String,
) -> Vec<T> {
    let n = items.len();

    let mut deps: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut edge_count = 0usize;
    for i in 0..n {
        for j in 0..n {
            if i != j && depends_on(&items[i], &items[j]) {
                deps[i].push(j);
                edge_count += 1;
            }
        }
    }

    if edge_count == 0 {
        debug!("no dependencies between {} items, no need to sort", n);
        return items;
    }

    let Some(order) = linearize(&deps, &items, &label) else {
        // Cycle: keep the input order untouched
        return items;
    };

    report_changes(&items, &order, &label);

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

/// Reverse-postorder DFS over the dependency edges
///
/// Returns `None` when a cycle is found, logging it once at the item where
/// it was detected.
fn linearize<T>(
    deps: &[Vec<usize>],
    items: &[T],
    label: &impl Fn(&T) -> String,
) -> Option<Vec<usize>> {
    let n = items.len();
    let mut marks = vec![Mark::Unvisited; n];
    let mut postorder = Vec::with_capacity(n);

    for start in 0..n {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        marks[start] = Mark::InProgress;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some((node, edge)) = stack.pop() {
            if edge < deps[node].len() {
                let next = deps[node][edge];
                stack.push((node, edge + 1));
                match marks[next] {
                    Mark::Unvisited => {
                        marks[next] = Mark::InProgress;
                        stack.push((next, 0));
                    }
                    Mark::InProgress => {
                        error!(
                            "cannot sort by dependencies, cycle found at {}",
                            label(&items[next])
                        );
                        return None;
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                postorder.push(node);
            }
        }
    }

    postorder.reverse();
    Some(postorder)
}

/// Log the first position whose occupant changed, or that nothing moved
fn report_changes<T>(items: &[T], order: &[usize], label: &impl Fn(&T) -> String) {
    match order.iter().enumerate().find(|(pos, &idx)| *pos != idx) {
        Some((pos, &idx)) => {
            info!(
                "sorted by dependencies: {} moved from position {} to {}",
                label(&items[idx]),
                idx,
                pos
            );
        }
        None => debug!("sorted by dependencies: no change"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
        type Writer = LogCapture;
        fn make_writer(&'a self) -> LogCapture {
            self.clone()
        }
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = capture.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// an item "a,b" depends on everything named in its suffix list
    fn depends(a: &&str, b: &&str) -> bool {
        let mut parts = a.split(',');
        let _name = parts.next();
        parts.any(|d| Some(d) == b.split(',').next())
    }

    fn name(item: &&str) -> String {
        item.split(',').next().unwrap_or_default().to_string()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|i| name(i)).collect()
    }

    #[test]
    fn test_no_edges_returns_input_order() {
        let items = vec!["a", "b", "c"];
        let sorted = sort(items.clone(), depends, name);
        assert_eq!(sorted, items);
    }

    #[test]
    fn test_dependent_comes_before_dependency() {
        // b depends on a: raw order must put b before a
        let items = vec!["a", "b,a"];
        let sorted = sort(items, depends, name);
        assert_eq!(names(&sorted), vec!["b", "a"]);
    }

    #[test]
    fn test_chain_is_fully_ordered() {
        let items = vec!["a", "b,a", "c,b"];
        let sorted = sort(items, depends, name);
        assert_eq!(names(&sorted), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_acyclic_output_is_permutation_honoring_edges() {
        let items = vec!["d,b,c", "b,a", "c,a", "a"];
        let sorted = sort(items.clone(), depends, name);

        assert_eq!(sorted.len(), items.len());
        for item in &items {
            assert!(sorted.contains(item));
        }
        // every dependent appears before each of its dependencies
        for (i, a) in sorted.iter().enumerate() {
            for b in &sorted[..i] {
                assert!(!depends(a, b), "{} depends on {} but came after it", a, b);
            }
        }
    }

    #[test]
    fn test_cycle_returns_input_unchanged() {
        let items = vec!["a,b", "b,c", "c,a", "d"];
        let sorted = sort(items.clone(), depends, name);
        assert_eq!(sorted, items, "cyclic input must pass through untouched");
    }

    #[test]
    fn test_cycle_is_logged_once() {
        // two distinct cycles; the sort is abandoned at the first one found
        let items = vec!["a,b", "b,a", "c,d", "d,c"];
        let output = capture_logs(|| {
            sort(items, depends, name);
        });
        assert_eq!(output.matches("cannot sort by dependencies").count(), 1);
    }

    #[test]
    fn test_self_reference_is_not_an_edge() {
        // the matcher is never asked about an item against itself
        let items = vec!["a,a", "b"];
        let sorted = sort(items.clone(), |a, b| depends(a, b), name);
        assert_eq!(sorted, items);
    }

    #[test]
    fn test_empty_and_single_inputs() {
        let empty: Vec<&str> = Vec::new();
        assert!(sort(empty, depends, name).is_empty());
        assert_eq!(sort(vec!["a"], depends, name), vec!["a"]);
    }
}
