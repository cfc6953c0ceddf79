use hecs::Entity;

use crate::world::fixed::{FRACBITS, Fixed};
use crate::world::geometry::{
    BBox, Blockmap, Level, Linedef, MAPBLOCKSHIFT, Node, NodeChild, SubsectorId,
};

// ──────────────────────────────────────────────────────────────────────────
//                       Level – public helpers
// ──────────────────────────────────────────────────────────────────────────
impl Level {
    /// Index of the BSP root (`nodes.len()-1` in Doom), `None` for a
    /// single sub-sector map.
    #[inline(always)]
    pub fn bsp_root(&self) -> Option<u16> {
        self.nodes.len().checked_sub(1).map(|n| n as u16)
    }

    /// Walk the BSP and return the subsector id containing `(x, y)`.
    ///
    /// The walk takes at most one step per node; a tree that loops (only
    /// possible for a hand-built `Level`) falls back to sub-sector 0.
    pub fn point_in_subsector(&self, x: Fixed, y: Fixed) -> SubsectorId {
        let Some(mut idx) = self.bsp_root() else {
            return 0;
        };
        for _ in 0..self.nodes.len() {
            let Some(node) = self.nodes.get(idx as usize) else {
                break;
            };
            match NodeChild::from_raw(node.children[node.point_on_side(x, y)]) {
                NodeChild::Subsector(ss) => return ss,
                NodeChild::Node(n) => idx = n,
            }
        }
        log::warn!("bsp walk from ({x:?}, {y:?}) never reached a leaf");
        0
    }

    /// Sector under `(x, y)`.
    #[inline]
    pub fn sector_at(&self, x: Fixed, y: Fixed) -> u16 {
        self.subsectors[self.point_in_subsector(x, y) as usize].sector
    }

    /// Vanilla-style iterator over *unique* linedefs listed by the blockmap
    /// cells that `bbox` touches.  Stops early if `func` returns false.
    pub fn block_lines_iter<F>(&self, bbox: BBox, mut func: F) -> bool
    where
        F: FnMut(u16, &Linedef) -> bool,
    {
        let bm = &self.blockmap;
        if bm.width <= 0 || bm.height <= 0 {
            return true;
        }

        let mut visited = vec![false; self.linedefs.len()];

        let bx1 = ((bbox.left - bm.origin_x).raw() >> MAPBLOCKSHIFT).clamp(0, bm.width - 1);
        let bx2 = ((bbox.right - bm.origin_x).raw() >> MAPBLOCKSHIFT).clamp(0, bm.width - 1);
        let by1 = ((bbox.bottom - bm.origin_y).raw() >> MAPBLOCKSHIFT).clamp(0, bm.height - 1);
        let by2 = ((bbox.top - bm.origin_y).raw() >> MAPBLOCKSHIFT).clamp(0, bm.height - 1);

        for by in by1..=by2 {
            for bx in bx1..=bx2 {
                let cell = (by * bm.width + bx) as usize;
                for li in bm.cell_lines(cell) {
                    let Some(seen) = visited.get_mut(li as usize) else {
                        continue;
                    };
                    if *seen {
                        continue;
                    }
                    *seen = true;

                    if !func(li, &self.linedefs[li as usize]) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                       Node geometry helpers
// ──────────────────────────────────────────────────────────────────────────
impl Node {
    /// 0 = *front* of splitter, 1 = *back*.
    #[inline(always)]
    pub fn point_on_side(&self, x: Fixed, y: Fixed) -> usize {
        if self.dx.is_zero() {
            return if x <= self.x {
                (self.dy.raw() > 0) as usize
            } else {
                (self.dy.raw() < 0) as usize
            };
        }
        if self.dy.is_zero() {
            return if y <= self.y {
                (self.dx.raw() < 0) as usize
            } else {
                (self.dx.raw() > 0) as usize
            };
        }

        let dx = x - self.x;
        let dy = y - self.y;

        // sign bits alone decide the quick cases
        if (self.dy.raw() ^ self.dx.raw() ^ dx.raw() ^ dy.raw()) < 0 {
            return ((self.dy.raw() ^ dx.raw()) < 0) as usize;
        }

        let left = Fixed(self.dy.raw() >> FRACBITS) * dx;
        let right = dy * Fixed(self.dx.raw() >> FRACBITS);
        if right < left { 0 } else { 1 }
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                       Blockmap object chains
// ──────────────────────────────────────────────────────────────────────────
impl Blockmap {
    pub fn link(&mut self, cell: usize, e: Entity) {
        if let Some(chain) = self.links.get_mut(cell) {
            chain.push(e);
        }
    }

    pub fn unlink(&mut self, cell: usize, e: Entity) {
        if let Some(chain) = self.links.get_mut(cell) {
            if let Some(pos) = chain.iter().position(|&x| x == e) {
                chain.swap_remove(pos);
            }
        }
    }

    /// Objects currently linked into `cell`.
    pub fn objects(&self, cell: usize) -> &[Entity] {
        self.links.get(cell).map_or(&[][..], |c| c.as_slice())
    }
}
