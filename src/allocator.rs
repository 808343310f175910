use log::debug;

use crate::geometry::Geometry;
use crate::memory::PhysicalMemory;

/// Decision on where the next frame comes from.
///
/// `Reclaim` and `Evict` carry the page prefix under which the frame was
/// found, so the caller can unlink it from its former parent before reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// A frame beyond the highest index in use. Never been linked; the
    /// caller only has to clear it.
    Fresh { frame: usize },
    /// An interior table with no children. Already zero-filled.
    Reclaim { frame: usize, prefix: u64 },
    /// The resident leaf whose page lies at maximal cyclic distance from
    /// the target page.
    Evict { frame: usize, page: u64 },
}

/// Distance between two pages on the page-number circle.
pub fn cyclic_distance(num_pages: u64, p: u64, q: u64) -> u64 {
    let d = p.abs_diff(q);
    d.min(num_pages - d)
}

struct Victim {
    frame: usize,
    page: u64,
    dist: u64,
}

/// One depth-first pass over the live tree, gathering everything the
/// placement decision needs.
struct TreeScan<'a> {
    pm: &'a PhysicalMemory,
    geometry: &'a Geometry,
    /// Page the caller is faulting in.
    target: u64,
    /// Frame the caller is currently walking through; never a candidate.
    avoid: usize,
    max_seen: usize,
    empty: Option<(usize, u64)>,
    victim: Option<Victim>,
}

impl TreeScan<'_> {
    fn visit(&mut self, frame: usize, depth: u32, prefix: u64) {
        self.max_seen = self.max_seen.max(frame);

        if depth == self.geometry.tables_depth() {
            // Leaf: candidate for eviction, never for reclaim. On equal
            // distance the later leaf in scan order replaces the earlier.
            if frame != self.avoid {
                let dist = cyclic_distance(self.geometry.num_pages(), self.target, prefix);
                if self.victim.as_ref().map_or(true, |v| dist >= v.dist) {
                    self.victim = Some(Victim {
                        frame,
                        page: prefix,
                        dist,
                    });
                }
            }
            return;
        }

        let mut children = 0;
        for index in 0..self.geometry.page_size() {
            let entry = self.pm.entry(frame, index);
            if entry != 0 {
                children += 1;
                let child_prefix = (prefix << self.geometry.offset_width()) | index as u64;
                self.visit(entry as usize, depth + 1, child_prefix);
            }
        }

        // A childless table can be handed out as-is. The root stays put
        // even when the whole tree is empty. Later finds overwrite earlier
        // ones, matching the scan order the eviction candidate uses.
        if children == 0 && frame != self.avoid && frame != 0 {
            let shift = self.geometry.offset_width() * (self.geometry.tables_depth() - depth);
            self.empty = Some((frame, prefix << shift));
        }
    }
}

/// Find a frame to back `target` page. Single DFS from the root, then the
/// priority order: a never-used frame, a childless table, the most distant
/// resident leaf. `avoid` is excluded from the latter two outcomes.
///
/// This only reads memory; acting on the decision (clearing, evicting,
/// unlinking) is the caller's job.
pub fn find_frame(
    pm: &PhysicalMemory,
    geometry: &Geometry,
    target: u64,
    avoid: usize,
) -> Placement {
    let mut scan = TreeScan {
        pm,
        geometry,
        target,
        avoid,
        max_seen: 0,
        empty: None,
        victim: None,
    };
    scan.visit(0, 0, 0);

    let placement = if scan.max_seen + 1 < geometry.num_frames() {
        Placement::Fresh {
            frame: scan.max_seen + 1,
        }
    } else if let Some((frame, prefix)) = scan.empty {
        Placement::Reclaim { frame, prefix }
    } else {
        // With no fresh frame and no empty table, every frame is a leaf or
        // a table on a path to one, so at least one leaf was scanned.
        let v = scan
            .victim
            .expect("a saturated page-table tree always holds a leaf");
        Placement::Evict {
            frame: v.frame,
            page: v.page,
        }
    };
    debug!("find_frame: page {target:#x} avoid {avoid} -> {placement:?}");
    placement
}
