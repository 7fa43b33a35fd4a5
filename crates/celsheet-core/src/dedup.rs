use crate::frame::FrameSource;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Groups of pixel-identical frames.
///
/// Every frame `i` is linked to the first later frame `j` it matches. Links are merged with
/// union-find, so chains such as `a == b`, `b == c` always end up in one group regardless of
/// input order. The representative ("original") of a group is its lowest frame index.
#[derive(Debug, Clone)]
pub struct DuplicateFrameIndex {
    original: Vec<Option<usize>>,
    group_size: Vec<usize>,
}

impl DuplicateFrameIndex {
    /// Scans every pair `(i, j)` with `i < j` and registers the first match of each `i`.
    pub fn register_if_identical<F: FrameSource>(frames: &[F], parallel: bool) -> Self {
        let partners = first_partners(frames, parallel);
        let mut sets = DisjointSets::new(frames.len());
        for (i, partner) in partners.into_iter().enumerate() {
            if let Some(j) = partner {
                sets.union(i, j);
            }
        }

        let roots: Vec<usize> = (0..frames.len()).map(|i| sets.find(i)).collect();
        let mut sizes = vec![0usize; frames.len()];
        for &r in &roots {
            sizes[r] += 1;
        }
        let original = roots
            .iter()
            .map(|&r| if sizes[r] > 1 { Some(r) } else { None })
            .collect();
        let group_size = roots.iter().map(|&r| sizes[r]).collect();
        Self {
            original,
            group_size,
        }
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// Representative of the frame's group, or `None` if the frame has no duplicate.
    pub fn original_of(&self, index: usize) -> Option<usize> {
        self.original.get(index).copied().flatten()
    }

    /// True if `index` is a duplicate whose representative is another frame.
    pub fn is_duplicate(&self, index: usize) -> bool {
        self.original_of(index).is_some_and(|o| o != index)
    }

    /// Number of frames in the frame's group (1 for a unique frame).
    pub fn group_size(&self, index: usize) -> usize {
        self.group_size.get(index).copied().unwrap_or(1)
    }

    /// Number of frames that are not their group's representative.
    pub fn reused_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_duplicate(i)).count()
    }

    /// Groups with at least two members, each listed in frame order.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut slot_of_root = vec![usize::MAX; self.len()];
        for (i, original) in self.original.iter().enumerate() {
            let Some(root) = *original else { continue };
            if slot_of_root[root] == usize::MAX {
                slot_of_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[slot_of_root[root]].push(i);
        }
        groups
    }
}

fn first_partners<F: FrameSource>(frames: &[F], parallel: bool) -> Vec<Option<usize>> {
    let first_match = |i: usize| {
        let a = &frames[i];
        (i + 1..frames.len()).find(|&j| {
            let b = &frames[j];
            // size mismatch rules out a pixel scan
            a.width() == b.width() && a.height() == b.height() && a.pixel_equals(b)
        })
    };
    #[cfg(feature = "parallel")]
    {
        if parallel {
            return (0..frames.len()).into_par_iter().map(first_match).collect();
        }
    }
    let _ = parallel;
    (0..frames.len()).map(first_match).collect()
}

/// Union-find whose root is always the smallest index of its set.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[child] = root;
    }
}
