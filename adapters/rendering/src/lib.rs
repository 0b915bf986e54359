#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless rendering collaborator for Monster Defence adapters.
//!
//! [`HeadlessScene`] implements the simulation's [`SceneContext`] contract by
//! bookkeeping drawables in memory, and [`HeadlessBackend`] plays the role of
//! the frame clock: it invokes the adapter's per-frame update a fixed number
//! of times, hands it the pointer-downs scripted for that frame, and presents
//! whenever a redraw was requested.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result as AnyResult};
use glam::Vec2;
use monster_defence_core::{AssetKey, DrawableHandle, GridDimensions, PixelPosition, SceneContext};

/// State of a single drawable tracked by the headless scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneDrawable {
    /// Asset the drawable displays.
    pub asset: AssetKey,
    /// Pixel position of the drawable's top-left corner.
    pub position: PixelPosition,
    /// Whether the drawable is part of the visible scene.
    pub attached: bool,
}

/// In-memory scene that records every call made by the simulation.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    next_handle: u32,
    drawables: HashMap<DrawableHandle, SceneDrawable>,
    draw_order: Vec<DrawableHandle>,
    redraw_requests: u64,
    redraw_pending: bool,
}

impl HeadlessScene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a drawable by handle.
    #[must_use]
    pub fn drawable(&self, handle: DrawableHandle) -> Option<&SceneDrawable> {
        self.drawables.get(&handle)
    }

    /// Number of drawables currently held by the scene.
    #[must_use]
    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    /// Attached drawables from bottom to top.
    pub fn attached(&self) -> impl Iterator<Item = (DrawableHandle, &SceneDrawable)> + '_ {
        self.draw_order
            .iter()
            .filter_map(|handle| self.drawables.get(handle).map(|drawable| (*handle, drawable)))
    }

    /// Number of drawables currently attached.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.draw_order.len()
    }

    /// Total number of redraw requests received.
    #[must_use]
    pub const fn redraw_requests(&self) -> u64 {
        self.redraw_requests
    }

    /// Returns whether a redraw was requested since the last call, clearing
    /// the request.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_pending)
    }

    fn drawable_mut(&mut self, handle: DrawableHandle) -> Option<&mut SceneDrawable> {
        let drawable = self.drawables.get_mut(&handle);
        if drawable.is_none() {
            tracing::warn!(handle = handle.get(), "unknown drawable handle");
        }
        drawable
    }
}

impl SceneContext for HeadlessScene {
    fn create_drawable(&mut self, asset: &AssetKey) -> DrawableHandle {
        let handle = DrawableHandle::new(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        let _ = self.drawables.insert(
            handle,
            SceneDrawable {
                asset: asset.clone(),
                position: PixelPosition::ORIGIN,
                attached: false,
            },
        );
        handle
    }

    fn set_position(&mut self, handle: DrawableHandle, position: PixelPosition) {
        if let Some(drawable) = self.drawable_mut(handle) {
            drawable.position = position;
        }
    }

    fn attach(&mut self, handle: DrawableHandle) {
        let Some(drawable) = self.drawable_mut(handle) else {
            return;
        };
        drawable.attached = true;
        // Re-attaching raises the drawable to the top.
        self.draw_order.retain(|existing| *existing != handle);
        self.draw_order.push(handle);
    }

    fn detach(&mut self, handle: DrawableHandle) {
        let Some(drawable) = self.drawable_mut(handle) else {
            return;
        };
        drawable.attached = false;
        self.draw_order.retain(|existing| *existing != handle);
    }

    fn destroy(&mut self, handle: DrawableHandle) {
        if self.drawables.remove(&handle).is_none() {
            tracing::warn!(handle = handle.get(), "unknown drawable handle");
            return;
        }
        self.draw_order.retain(|existing| *existing != handle);
    }

    fn request_redraw(&mut self) {
        self.redraw_requests = self.redraw_requests.saturating_add(1);
        self.redraw_pending = true;
    }
}

/// Input gathered by the backend for a single frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Zero-based index of the frame.
    pub frame: u64,
    /// Pointer-down positions in world space, in the order they occurred.
    pub pointer_downs: Vec<Vec2>,
}

/// Counters describing a completed backend run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of frames the update callback was invoked for.
    pub frames_run: u64,
    /// Number of frames presented because a redraw was requested.
    pub frames_presented: u64,
}

/// Rendering backend capable of driving Monster Defence frames.
pub trait RenderingBackend {
    /// Runs the backend until it stops producing frames.
    ///
    /// The provided `update_scene` closure is invoked once per frame with that
    /// frame's input and may mutate the scene before it is presented. An error
    /// returned by the closure aborts the run.
    fn run<F>(self, scene: &mut HeadlessScene, update_scene: F) -> AnyResult<RunSummary>
    where
        F: FnMut(FrameInput, &mut HeadlessScene) -> AnyResult<()>;
}

/// Backend that produces a fixed number of frames with scripted pointer input.
#[derive(Clone, Debug, Default)]
pub struct HeadlessBackend {
    frames: u64,
    pointer_script: BTreeMap<u64, Vec<Vec2>>,
}

impl HeadlessBackend {
    /// Creates a backend that runs exactly `frames` frames.
    #[must_use]
    pub fn new(frames: u64) -> Self {
        Self {
            frames,
            pointer_script: BTreeMap::new(),
        }
    }

    /// Schedules a pointer-down at `position` during `frame`.
    #[must_use]
    pub fn with_pointer_down(mut self, frame: u64, position: Vec2) -> Self {
        self.pointer_script.entry(frame).or_default().push(position);
        self
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(mut self, scene: &mut HeadlessScene, mut update_scene: F) -> AnyResult<RunSummary>
    where
        F: FnMut(FrameInput, &mut HeadlessScene) -> AnyResult<()>,
    {
        let mut summary = RunSummary::default();

        for frame in 0..self.frames {
            let pointer_downs = self.pointer_script.remove(&frame).unwrap_or_default();
            update_scene(
                FrameInput {
                    frame,
                    pointer_downs,
                },
                scene,
            )
            .with_context(|| format!("failed to update frame {frame}"))?;

            summary.frames_run += 1;
            if scene.take_redraw_request() {
                summary.frames_presented += 1;
            }
        }

        if !self.pointer_script.is_empty() {
            tracing::warn!(
                pending = self.pointer_script.len(),
                "pointer input scheduled after the last frame was dropped"
            );
        }

        Ok(summary)
    }
}

/// Converts a world-space cursor position into the pixel containing it.
#[must_use]
pub fn pixel_at(position: Vec2) -> PixelPosition {
    let floored = position.floor();
    PixelPosition::new(floored.x as i64, floored.y as i64)
}

/// Pixel-space centre of the cell anchored at `origin`, as a cursor position.
#[must_use]
pub fn cell_center(origin: PixelPosition, cell_size: u32) -> Vec2 {
    let half = cell_size as f32 / 2.0;
    Vec2::new(origin.x as f32 + half, origin.y as f32 + half)
}

/// Renders the attached drawables into a text frame with one glyph per cell.
///
/// Drawables are painted bottom to top; `glyph_for` decides which glyph a
/// drawable contributes, or `None` to leave it out. Drawables whose anchor
/// lies off the field are skipped.
pub fn render_text<G>(scene: &HeadlessScene, dimensions: GridDimensions, mut glyph_for: G) -> String
where
    G: FnMut(DrawableHandle, &SceneDrawable) -> Option<char>,
{
    let columns = dimensions.columns() as usize;
    let rows = dimensions.rows() as usize;
    let mut cells = vec![' '; columns * rows];

    for (handle, drawable) in scene.attached() {
        let Some(glyph) = glyph_for(handle, drawable) else {
            continue;
        };
        if let Some(index) = dimensions.index_at(drawable.position) {
            if let Some(cell) = cells.get_mut(index.get() as usize) {
                *cell = glyph;
            }
        }
    }

    cells
        .chunks(columns)
        .map(|row| row.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawables_start_detached_at_the_origin() {
        let mut scene = HeadlessScene::new();
        let handle = scene.create_drawable(&AssetKey::sprite("bulbasaur"));

        let drawable = scene.drawable(handle).expect("drawable exists");
        assert_eq!(drawable.position, PixelPosition::ORIGIN);
        assert!(!drawable.attached);
        assert_eq!(scene.attached_count(), 0);
    }

    #[test]
    fn attach_order_is_draw_order_and_reattach_raises() {
        let mut scene = HeadlessScene::new();
        let first = scene.create_drawable(&AssetKey::sprite("a"));
        let second = scene.create_drawable(&AssetKey::sprite("b"));

        scene.attach(first);
        scene.attach(second);
        scene.attach(first);

        let order: Vec<_> = scene.attached().map(|(handle, _)| handle).collect();
        assert_eq!(order, vec![second, first]);
    }

    #[test]
    fn detach_removes_from_the_visible_scene() {
        let mut scene = HeadlessScene::new();
        let handle = scene.create_drawable(&AssetKey::sprite("grass"));
        scene.attach(handle);
        scene.detach(handle);

        assert_eq!(scene.attached_count(), 0);
        assert!(!scene.drawable(handle).expect("still tracked").attached);
    }

    #[test]
    fn destroy_releases_the_drawable() {
        let mut scene = HeadlessScene::new();
        let kept = scene.create_drawable(&AssetKey::sprite("bulbasaur"));
        let released = scene.create_drawable(&AssetKey::sprite("grass"));
        scene.attach(kept);
        scene.attach(released);

        scene.destroy(released);
        scene.destroy(released);

        assert!(scene.drawable(released).is_none());
        assert_eq!(scene.drawable_count(), 1);
        let order: Vec<_> = scene.attached().map(|(handle, _)| handle).collect();
        assert_eq!(order, vec![kept]);
    }

    #[test]
    fn unknown_handles_are_ignored() {
        let mut scene = HeadlessScene::new();
        scene.set_position(DrawableHandle::new(42), PixelPosition::new(1, 1));
        scene.attach(DrawableHandle::new(42));

        assert_eq!(scene.drawable_count(), 0);
        assert_eq!(scene.attached_count(), 0);
    }

    #[test]
    fn redraw_requests_are_latched_until_taken() {
        let mut scene = HeadlessScene::new();
        scene.request_redraw();
        scene.request_redraw();

        assert!(scene.take_redraw_request());
        assert!(!scene.take_redraw_request());
        assert_eq!(scene.redraw_requests(), 2);
    }

    #[test]
    fn backend_delivers_scripted_input_on_its_frame() {
        let backend = HeadlessBackend::new(3)
            .with_pointer_down(1, Vec2::new(4.0, 4.0))
            .with_pointer_down(1, Vec2::new(20.0, 4.0));
        let mut scene = HeadlessScene::new();
        let mut seen = Vec::new();

        let summary = backend
            .run(&mut scene, |input, scene| {
                seen.push((input.frame, input.pointer_downs.len()));
                if input.frame != 2 {
                    scene.request_redraw();
                }
                Ok(())
            })
            .expect("run succeeds");

        assert_eq!(seen, vec![(0, 0), (1, 2), (2, 0)]);
        assert_eq!(
            summary,
            RunSummary {
                frames_run: 3,
                frames_presented: 2,
            }
        );
    }

    #[test]
    fn backend_stops_on_update_errors() {
        let mut scene = HeadlessScene::new();
        let mut calls = 0;

        let result = HeadlessBackend::new(5).run(&mut scene, |input, _| {
            calls += 1;
            if input.frame == 1 {
                anyhow::bail!("boom");
            }
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn pixel_at_floors_negative_coordinates() {
        assert_eq!(pixel_at(Vec2::new(15.9, 0.2)), PixelPosition::new(15, 0));
        assert_eq!(pixel_at(Vec2::new(-0.5, 3.0)), PixelPosition::new(-1, 3));
    }

    #[test]
    fn text_frame_paints_top_drawables_last() {
        let dimensions = GridDimensions::new(3, 2, 10).expect("valid dimensions");
        let mut scene = HeadlessScene::new();
        for row in 0..2 {
            for column in 0..3 {
                let tile = scene.create_drawable(&AssetKey::sprite("background"));
                scene.set_position(tile, PixelPosition::new(column * 10, row * 10));
                scene.attach(tile);
            }
        }
        let tower = scene.create_drawable(&AssetKey::sprite("bulbasaur"));
        scene.set_position(tower, PixelPosition::new(10, 10));
        scene.attach(tower);
        let escaped = scene.create_drawable(&AssetKey::sprite("grass"));
        scene.set_position(escaped, PixelPosition::new(-10, 0));
        scene.attach(escaped);

        let frame = render_text(&scene, dimensions, |_, drawable| {
            match drawable.asset.as_str() {
                "img/background.png" => Some('.'),
                "img/bulbasaur.png" => Some('G'),
                _ => Some('*'),
            }
        });

        assert_eq!(frame, "...\n.G.");
    }
}
