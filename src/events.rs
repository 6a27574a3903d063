//! Event dispatch boundary.
//!
//! Host input handlers call these functions. Each one drives the controller
//! and logs any error instead of returning it, so a failed preview never
//! reaches the host's event loop.

use std::time::Instant;

use crate::context::Context;
use crate::error::Error;
use crate::host::{EditorSurface, Workspace};
use crate::types::{BacklinkId, ElementId, SessionKind};

/// What kind of marker an element is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// A backlink marker, identified by its backlink id.
    Backlink(BacklinkId),
    /// A reference marker carrying its token.
    Reference(String),
}

/// The marker under the pointer or cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerTarget {
    /// Host element of the marker.
    pub element: ElementId,
    /// Marker kind and payload.
    pub marker: Marker,
}

/// A click, pinning the preview under it. Open documents are queued for
/// recompute since a click may have moved text around.
pub fn clicked<H>(context: &mut Context, host: &mut H, target: Option<&PointerTarget>, now: Instant)
where
    H: Workspace + EditorSurface,
{
    if let Some(target) = target {
        let kind = match target.marker {
            Marker::Backlink(_) => SessionKind::BacklinkHover,
            Marker::Reference(_) => SessionKind::Hover,
        };
        if context.controller.open(kind, host) {
            tracing::info!(%kind, element = %target.element, "preview opened");
        }
    }
    request_open_files(context, host, now);
}

/// The text cursor moved. Inside a reference token the cursor preview
/// follows it; anywhere else it ends.
pub fn cursor_moved<H>(context: &mut Context, host: &mut H, target: Option<&PointerTarget>, now: Instant)
where
    H: Workspace + EditorSurface,
{
    let token = target.and_then(|target| {
        return match &target.marker {
            Marker::Backlink(_) => None,
            Marker::Reference(token) => Some((&target.element, token)),
        };
    });

    match token {
        None => {
            report("end cursor preview", context.controller.end_cursor(host));
        },
        Some((_, token)) if context.controller.store().active_on(SessionKind::Cursor, token) => {},
        Some((element, token)) => {
            report("end cursor preview", context.controller.end_cursor(host));
            report("start cursor preview", context.controller.start_cursor(host, element, token));
        },
    }
    request_open_files(context, host, now);
}

/// A document's text changed on disk or in an editor.
pub fn document_changed(context: &mut Context, path: &str, now: Instant) {
    context.request_file(path, now);
}

/// The pointer moved. Resting on a marker starts its preview; leaving every
/// marker ends the hover previews.
pub fn pointer_moved<H>(context: &mut Context, host: &mut H, target: Option<&PointerTarget>)
where
    H: Workspace + EditorSurface,
{
    let Some(target) = target else {
        report("end hover preview", context.controller.end_hover(host));
        report("end backlink preview", context.controller.end_backlink(host));
        return;
    };

    match &target.marker {
        Marker::Backlink(id) => {
            report(
                "start backlink preview",
                context.controller.start_backlink(host, &context.index, &target.element, id),
            );
        },
        Marker::Reference(token) => {
            report("start hover preview", context.controller.start_hover(host, &target.element, token));
        },
    }
}

/// Log a failed action.
fn report<T>(action: &str, result: Result<T, Error>) {
    if let Err(e) = result {
        tracing::error!(action, "{e}");
    }
}

/// Queue a recompute for every document shown in a leaf.
fn request_open_files<H: Workspace>(context: &mut Context, host: &H, now: Instant) {
    for path in host.open_files() {
        context.request_file(&path, now);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::Config;
    use crate::corpus::MemoryCorpus;
    use crate::fake_host::FakeHost;
    use crate::types::LeafId;

    const TOKEN: &str = "ref://b.md#0-2/\"hi\"";

    fn setup() -> (Context, FakeHost, PointerTarget) {
        let start = Instant::now();
        let context = Context::load(Config::default(), start);
        let mut host = FakeHost::default()
            .with_file("a.md", "see [↗](ref://b.md#0-2/\"hi\")\n")
            .with_file("b.md", "hi there\n")
            .with_file("c.md", "one more line\n");
        let leaf = host.open_leaf("leaf-a", "a.md", 0.0);
        let element = host.place_marker("m-1", &leaf);
        let target = PointerTarget {
            element,
            marker: Marker::Reference(TOKEN.to_string()),
        };
        return (context, host, target);
    }

    fn temp(n: usize) -> LeafId {
        return LeafId(format!("temp-{n}"));
    }

    #[test]
    fn pointer_over_marker_previews_until_it_leaves() {
        let (mut context, mut host, target) = setup();

        pointer_moved(&mut context, &mut host, Some(&target));
        assert!(context.controller().store().active_on(SessionKind::Hover, TOKEN));
        assert_eq!(host.highlights(&temp(1)), vec![0..2]);

        pointer_moved(&mut context, &mut host, None);
        assert!(context.controller().store().is_idle());
        assert_eq!(host.detached, vec![temp(1)]);
    }

    #[test]
    fn failed_start_is_swallowed() {
        let (mut context, mut host, mut target) = setup();
        target.marker = Marker::Reference("ref://nowhere".to_string());

        pointer_moved(&mut context, &mut host, Some(&target));
        assert!(context.controller().store().is_idle());
    }

    #[test]
    fn cursor_follows_tokens_and_ends_elsewhere() {
        let (mut context, mut host, target) = setup();
        let now = Instant::now();

        cursor_moved(&mut context, &mut host, Some(&target), now);
        assert!(context.controller().store().active_on(SessionKind::Cursor, TOKEN));

        // Staying inside the same token keeps the preview as is.
        cursor_moved(&mut context, &mut host, Some(&target), now);
        assert!(!host.leaves.contains_key(&temp(2)));

        let other = PointerTarget {
            element: target.element.clone(),
            marker: Marker::Reference("ref://c.md#0-3/\"one\"".to_string()),
        };
        cursor_moved(&mut context, &mut host, Some(&other), now);
        assert_eq!(host.detached, vec![temp(1)]);
        assert_eq!(host.leaves.get(&temp(2)).map(|l| l.file.as_str()), Some("c.md"));

        cursor_moved(&mut context, &mut host, None, now);
        assert!(context.controller().store().is_idle());
    }

    #[test]
    fn click_pins_preview_and_queues_open_documents() {
        let (mut context, mut host, target) = setup();
        let start = Instant::now();
        let corpus = MemoryCorpus::default();
        context.tick(&corpus, start + Duration::from_secs(1)).unwrap();

        pointer_moved(&mut context, &mut host, Some(&target));
        clicked(&mut context, &mut host, Some(&target), start);
        pointer_moved(&mut context, &mut host, None);

        assert!(host.detached.is_empty(), "pinned preview stays open");
        assert_eq!(host.leaves.get(&temp(1)).map(|l| l.opacity), Some(1.0));
        assert_eq!(context.next_deadline(start), Some(context.config().file_recompute_debounce));
    }

    #[test]
    fn document_change_recomputes_that_document() {
        let (mut context, _, _) = setup();
        let start = Instant::now();
        let mut corpus = MemoryCorpus::default();
        corpus.write("b.md", "hi there\n");
        context.tick(&corpus, start + Duration::from_secs(1)).unwrap();
        assert!(context.index().is_empty());

        corpus.write("a.md", "see [↗](ref://b.md#0-2/\"hi\")\n");
        document_changed(&mut context, "a.md", start);
        let delta = context.tick(&corpus, start + Duration::from_secs(1)).unwrap();
        assert_eq!(delta.added.len(), 1);
        assert_eq!(context.index().backlinks_from("a.md").len(), 1);
    }
}
