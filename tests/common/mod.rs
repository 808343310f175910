use pagewalk::{Geometry, PhysicalMemory, VmManager};

/// Walk the live page-table tree and assert its structural invariants:
/// every link points to a frame in `[1, num_frames)`, and no frame is
/// linked from two parents (which also rules out cycles). Returns the
/// resident leaves as `(frame, page)` pairs.
pub fn check_tree(vm: &VmManager) -> Vec<(usize, u64)> {
    let geometry = vm.geometry();
    let pm = vm.physical_memory();
    let mut seen = vec![false; geometry.num_frames()];
    seen[0] = true;
    let mut leaves = Vec::new();
    walk(pm, geometry, 0, 0, 0, &mut seen, &mut leaves);
    leaves
}

fn walk(
    pm: &PhysicalMemory,
    geometry: &Geometry,
    frame: usize,
    depth: u32,
    prefix: u64,
    seen: &mut [bool],
    leaves: &mut Vec<(usize, u64)>,
) {
    if depth == geometry.tables_depth() {
        leaves.push((frame, prefix));
        return;
    }
    for index in 0..geometry.page_size() {
        let entry = pm.entry(frame, index);
        if entry == 0 {
            continue;
        }
        let child = entry as usize;
        assert!(
            child >= 1 && child < geometry.num_frames(),
            "table entry {child} out of range at depth {depth}"
        );
        assert!(!seen[child], "frame {child} linked from two parents");
        seen[child] = true;
        let child_prefix = (prefix << geometry.offset_width()) | index as u64;
        walk(pm, geometry, child, depth + 1, child_prefix, seen, leaves);
    }
}
