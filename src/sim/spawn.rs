//! Spawn scheduler
//!
//! Sole owner of the grid cell pool. Every cell is at all times either in
//! the free pool or referenced by exactly one active hoop; `remove`,
//! `free_cell` and `clear_grid` hand cells back in the same call that drops
//! the hoop. Freeing a cell that is already free is a logic error and
//! panics.

use std::collections::HashSet;

use glam::IVec3;
use rand::Rng;
use rand::distr::weighted::WeightedIndex;

use super::curve::DifficultyCurves;
use super::grid::SpawnGrid;
use super::hoop::{Axis, Hoop, HoopBehavior, HoopSpec, HoopTemplate};
use super::shuffle::shuffle;
use super::world::{Body, OverlapQuery, SurfaceFilter};

/// Template for `behavior`, falling back to the static template
///
/// Configuration validation rejects weighted behaviours without a template,
/// so the fallbacks only matter for hand-built catalogs.
pub fn resolve_template(catalog: &[HoopTemplate], behavior: HoopBehavior) -> HoopTemplate {
    if let Some(t) = catalog.iter().find(|t| t.behavior == behavior) {
        return *t;
    }
    log::warn!("No hoop template for {behavior:?}, falling back to static");
    catalog
        .iter()
        .find(|t| t.behavior == HoopBehavior::Static)
        .copied()
        .unwrap_or_default()
}

/// Draw a behaviour from non-negative weights; all-zero weights mean static
pub fn pick_behavior(weights: &[(HoopBehavior, f32)], rng: &mut impl Rng) -> HoopBehavior {
    let clamped: Vec<f32> = weights.iter().map(|(_, w)| w.max(0.0)).collect();
    match WeightedIndex::new(&clamped) {
        Ok(dist) => weights[rng.sample(&dist)].0,
        Err(_) => HoopBehavior::Static,
    }
}

#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    grid: SpawnGrid,
    free: Vec<IVec3>,
    /// Active hoops, ascending id
    hoops: Vec<Hoop>,
    next_id: u32,
}

impl SpawnScheduler {
    pub fn new(grid: SpawnGrid) -> Self {
        Self {
            free: grid.cells().collect(),
            grid,
            hoops: Vec::new(),
            next_id: 1,
        }
    }

    pub fn grid(&self) -> &SpawnGrid {
        &self.grid
    }

    pub fn free_cells(&self) -> &[IVec3] {
        &self.free
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn occupied_count(&self) -> usize {
        self.hoops.len()
    }

    pub fn active_hoops(&self) -> &[Hoop] {
        &self.hoops
    }

    pub fn hoop(&self, id: u32) -> Option<&Hoop> {
        self.hoops.iter().find(|h| h.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.hoops.is_empty()
    }

    /// Generate a batch sized from the round's spawn range
    pub fn populate_grid(
        &mut self,
        round: u32,
        difficulty: &DifficultyCurves,
        catalog: &[HoopTemplate],
        rng: &mut impl Rng,
    ) -> Vec<u32> {
        let (min, max) = difficulty.spawn_range(round);
        let count = rng.random_range(min..=max);
        let placed = self.spawn_batch(count, &difficulty.weights(round), catalog, rng);
        log::info!(
            "Round {round}: spawned {}/{count} hoops, {} cells free",
            placed.len(),
            self.free.len()
        );
        placed
    }

    /// Try to place `count` hoops; returns the ids actually placed
    ///
    /// Cells come off a shuffled free pool, so a request larger than the
    /// pool simply places fewer hoops. Static hoops are placed first; a
    /// mover that would sweep into a neighbouring hoop is skipped and its
    /// cell goes back to the pool.
    pub fn spawn_batch(
        &mut self,
        count: usize,
        weights: &[(HoopBehavior, f32)],
        catalog: &[HoopTemplate],
        rng: &mut impl Rng,
    ) -> Vec<u32> {
        shuffle(&mut self.free, rng);
        let take = count.min(self.free.len());
        let cells = self.free.split_off(self.free.len() - take);

        let mut batch: Vec<(IVec3, HoopTemplate)> = cells
            .into_iter()
            .map(|cell| (cell, resolve_template(catalog, pick_behavior(weights, rng))))
            .collect();
        batch.sort_by_key(|(_, t)| t.behavior.is_moving());

        let mut placed = Vec::with_capacity(batch.len());
        for (cell, template) in batch {
            match template.behavior.axis() {
                Some(axis) if self.blocks_mover(cell, axis, template.move_units) => {
                    log::debug!(
                        "Skipped {:?} hoop at {cell}: its path overlaps an active hoop",
                        template.behavior
                    );
                    self.free.push(cell);
                    continue;
                }
                _ => {}
            }

            let id = self.next_id;
            self.next_id += 1;
            let hoop = Hoop::spawn(id, &template, cell, &self.grid, rng);
            log::debug!("Placed hoop {id} ({:?}) at {cell}", template.behavior);
            self.hoops.push(hoop);
            placed.push(id);
        }
        placed
    }

    /// Whether a mover at `cell` would collide with an active hoop's path
    ///
    /// Rejected when an active hoop sits in the mover's swept cells, when
    /// `cell` lies in another mover's swept cells, or when two movers' swept
    /// cells overlap.
    fn blocks_mover(&self, cell: IVec3, axis: Axis, units: i32) -> bool {
        let swept: Vec<IVec3> = Hoop::axis_neighbours(cell, axis, units).collect();
        self.hoops.iter().any(|h| {
            swept.contains(&h.spec.cell)
                || h
                    .swept_neighbours()
                    .iter()
                    .any(|n| *n == cell || swept.contains(n))
        })
    }

    /// Drop a scored hoop and return its cell to the pool
    ///
    /// # Panics
    /// If no active hoop has `id`.
    pub fn remove(&mut self, id: u32) -> HoopSpec {
        let Some(index) = self.hoops.iter().position(|h| h.id() == id) else {
            panic!("remove: no active hoop with id {id}");
        };
        let hoop = self.hoops.remove(index);
        self.free.push(hoop.spec.cell);
        hoop.spec
    }

    /// Return `cell` to the pool, dropping the hoop that held it
    ///
    /// # Panics
    /// If `cell` is outside the grid or already free.
    pub fn free_cell(&mut self, cell: IVec3) -> HoopSpec {
        assert!(self.grid.contains(cell), "free_cell: {cell} is outside the grid");
        assert!(!self.free.contains(&cell), "free_cell: {cell} is already free");
        let Some(id) = self.hoops.iter().find(|h| h.spec.cell == cell).map(Hoop::id) else {
            panic!("free_cell: {cell} is neither free nor occupied");
        };
        self.remove(id)
    }

    /// Drop every hoop and return all cells to the pool
    pub fn clear_grid(&mut self) {
        if !self.hoops.is_empty() {
            log::debug!("Clearing {} hoops", self.hoops.len());
        }
        self.free.extend(self.hoops.drain(..).map(|h| h.spec.cell));
    }

    /// Move axis movers
    pub fn update(&mut self, dt: f32) {
        for hoop in &mut self.hoops {
            hoop.update(dt);
        }
    }

    /// First `(hoop id, body)` scoring this tick, checking hoops by id
    pub fn detect<Q: OverlapQuery + ?Sized>(
        &self,
        bodies: &Q,
        filter: SurfaceFilter,
    ) -> Option<(u32, Body)> {
        self.hoops
            .iter()
            .find_map(|h| h.detect(bodies, filter).map(|body| (h.id(), body)))
    }

    /// Every cell is in exactly one of {free pool, active hoop}
    pub fn occupancy_is_consistent(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.grid.total_cells());
        let all_unique = self
            .free
            .iter()
            .copied()
            .chain(self.hoops.iter().map(|h| h.spec.cell))
            .all(|cell| self.grid.contains(cell) && seen.insert(cell));
        all_unique && seen.len() == self.grid.total_cells()
    }
}
