//! Pipeline entry points and builders.
//!
//! [`Pipeline`] ties the store, LOD cache, viewport and scheduler together:
//! view mutations go through it so every change that moves the window also
//! restarts the debounced fine pass.

use std::sync::Arc;

use log::debug;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::config::PipelineConfig;
use crate::datasource::{Series, SeriesId, SeriesStore};
use crate::error::{PipelineError, Result};
use crate::geom::ChannelBand;
use crate::interaction::clamp_window;
use crate::lod::LodCache;
use crate::metrics::RenderMetrics;
use crate::render::{
    PassJob, PassKind, PassSettings, RenderRequest, RenderResult, SeriesPolyline, plan_pass,
};
use crate::resample::buffered_resolution;
use crate::scheduler::RenderScheduler;
use crate::transform::Transform;
use crate::view::Range;
use crate::viewport::{GestureState, ViewEvent, ViewportModel};

/// Receiver of fine-pass results.
pub type FineResults = mpsc::UnboundedReceiver<RenderResult>;

/// Multi-channel pan/zoom render pipeline.
///
/// View mutations only restart the debounced fine pass. The coarse pass is
/// never produced on its own: call [`Pipeline::render_coarse`] after a view
/// change to get the immediate whole-world frame.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    store: SeriesStore,
    cache: LodCache,
    viewport: ViewportModel,
    channels: Vec<Vec<SeriesId>>,
    scheduler: RenderScheduler,
}

impl Pipeline {
    /// Start building a pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Access the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Access the series store.
    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    /// Access the LOD cache.
    pub fn cache(&self) -> &LodCache {
        &self.cache
    }

    /// Access the viewport model.
    pub fn viewport(&self) -> &ViewportModel {
        &self.viewport
    }

    /// Current view window.
    pub fn window(&self) -> Range {
        self.viewport.window()
    }

    /// Series ids grouped by channel, top to bottom.
    pub fn channels(&self) -> &[Vec<SeriesId>] {
        &self.channels
    }

    /// Shared render counters.
    pub fn metrics(&self) -> &RenderMetrics {
        self.scheduler.metrics()
    }

    /// Points an undecimated frame would draw: one per pixel per series.
    pub fn theoretical_points(&self) -> usize {
        self.store.len() * self.viewport.screen_width().round() as usize
    }

    /// World units per pixel, for constant on-screen stroke widths.
    pub fn world_per_pixel(&self) -> f64 {
        self.viewport.world_per_pixel()
    }

    /// Gesture state. Settling turns into idle once no fine pass is pending.
    pub fn gesture_state(&mut self) -> GestureState {
        if self.viewport.state() == GestureState::Settling && !self.scheduler.has_pending() {
            self.viewport.settle();
        }
        self.viewport.state()
    }

    /// Pan by `delta` world units.
    ///
    /// Like every view mutation this schedules a fine pass only; fetch the
    /// coarse frame with [`Pipeline::render_coarse`].
    pub fn pan(&mut self, delta: f64) -> Result<Option<ViewEvent>> {
        let event = self.viewport.pan(delta);
        self.follow(event)
    }

    /// Pan by a screen-space delta.
    pub fn pan_pixels(&mut self, delta_pixels: f64) -> Result<Option<ViewEvent>> {
        let event = self.viewport.pan_pixels(delta_pixels);
        self.follow(event)
    }

    /// Zoom around a world anchor. A factor above 1 zooms in.
    pub fn zoom(&mut self, factor: f64, anchor: f64) -> Result<Option<ViewEvent>> {
        let event = self.viewport.zoom(factor, anchor);
        self.follow(event)
    }

    /// Zoom around a screen pixel.
    pub fn zoom_at_pixel(&mut self, factor: f64, screen_x: f64) -> Result<Option<ViewEvent>> {
        let event = self.viewport.zoom_at_pixel(factor, screen_x);
        self.follow(event)
    }

    /// Jump to a window, clamped into the world.
    pub fn set_view(&mut self, window: Range) -> Result<Option<ViewEvent>> {
        let event = self.viewport.set_window(window);
        self.follow(event)
    }

    /// Recenter the view on a world position, keeping its span.
    pub fn center_on(&mut self, world_x: f64) -> Result<Option<ViewEvent>> {
        let event = self.viewport.center_on(world_x);
        self.follow(event)
    }

    /// Finish the gesture: clear the point count and restart the fine pass.
    pub fn move_end(&mut self) -> Result<ViewEvent> {
        let event = self.viewport.move_end();
        self.scheduler.reset_metrics();
        self.request_fine()?;
        Ok(event)
    }

    /// Update screen geometry.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<Option<ViewEvent>> {
        let event = self.viewport.resize(width, height)?;
        self.request_fine()?;
        Ok(event)
    }

    /// Replace the values of a series and rebuild its levels lazily.
    pub fn replace_series(&mut self, id: SeriesId, values: impl Into<Arc<[f64]>>) -> Result<()> {
        let generation = self.store.replace_values(id, values.into())?;
        let dropped = self.cache.invalidate(id);
        debug!("series {id} replaced (generation {generation}), {dropped} levels dropped");
        self.request_fine()?;
        Ok(())
    }

    /// Build every level of every series up front.
    pub fn warm_cache(&mut self) -> Result<()> {
        for &id in self.store.ids() {
            self.cache.warm(&self.store, id, self.config.aggregation)?;
        }
        Ok(())
    }

    /// Compute the coarse pass synchronously.
    pub fn render_coarse(&mut self) -> Result<RenderResult> {
        let sequence = self.scheduler.next_coarse_sequence();
        let job = self.plan(PassKind::Coarse, sequence)?;
        Ok(self.scheduler.run_coarse(&job))
    }

    /// Compute a fine pass for the current view synchronously.
    ///
    /// Does not touch the debounce timer or the counters.
    pub fn render_fine_now(&mut self) -> Result<RenderResult> {
        let sequence = self.scheduler.latest_sequence();
        let job = self.plan(PassKind::Fine, sequence)?;
        Ok(job.run())
    }

    /// Compute one series for an explicit window, resolution and aggregation.
    ///
    /// The window is clamped into the world; the viewport is left untouched.
    pub fn render_request(&mut self, request: RenderRequest) -> Result<SeriesPolyline> {
        if !request.window.is_finite() {
            return Err(PipelineError::InvalidWindow {
                min: request.window.min,
                max: request.window.max,
            });
        }
        self.store.require(request.series)?;
        let world = self.viewport.world();
        let window = clamp_window(request.window, world, 0.0);
        let band = self
            .layout()
            .into_iter()
            .find(|(id, _)| *id == request.series)
            .map(|(_, band)| band)
            .unwrap_or_else(|| ChannelBand::new(0.0, self.viewport.screen_height()));
        let settings = PassSettings {
            aggregation: request.aggregation,
            ..self.pass_settings()
        };
        let job = plan_pass(
            PassKind::Fine,
            self.scheduler.latest_sequence(),
            window,
            Transform::for_valid(window, self.viewport.screen_width()),
            request.resolution,
            &settings,
            &[(request.series, band)],
            &self.store,
            &mut self.cache,
        )?;
        let mut result = job.run();
        result
            .polylines
            .pop()
            .ok_or(PipelineError::UnknownSeries(request.series))
    }

    /// Schedule a fine pass for the current view, replacing any pending one.
    ///
    /// Returns the sequence number the result will carry.
    pub fn request_fine(&mut self) -> Result<u64> {
        let sequence = self.scheduler.next_sequence();
        let job = self.plan(PassKind::Fine, sequence)?;
        self.scheduler.schedule_fine(job);
        Ok(sequence)
    }

    /// Cancel the pending fine pass, if any.
    pub fn cancel_fine(&mut self) -> bool {
        self.scheduler.cancel_pending()
    }

    /// Stop the background worker. Later fine passes run inline.
    pub fn shutdown_worker(&self) {
        self.scheduler.shutdown_worker();
    }

    fn follow(&mut self, event: Option<ViewEvent>) -> Result<Option<ViewEvent>> {
        if event.is_some() {
            self.request_fine()?;
        }
        Ok(event)
    }

    fn layout(&self) -> Vec<(SeriesId, ChannelBand)> {
        let bands = ChannelBand::split(self.viewport.screen_height(), self.channels.len());
        self.channels
            .iter()
            .zip(bands)
            .flat_map(|(channel, band)| channel.iter().map(move |&id| (id, band)))
            .collect()
    }

    fn pass_settings(&self) -> PassSettings {
        PassSettings {
            world: self.viewport.world(),
            buffer_frac: self.config.buffer_frac,
            aggregation: self.config.aggregation,
            simplifier: self.config.simplifier(),
            debug: self.config.debug_overlay,
        }
    }

    fn plan(&mut self, kind: PassKind, sequence: u64) -> Result<PassJob> {
        let factor = match kind {
            PassKind::Coarse => self.config.coarse_resolution_factor,
            PassKind::Fine => self.config.fine_resolution_factor,
        };
        let mut resolution = PipelineConfig::resolution(self.viewport.screen_width(), factor);
        if kind == PassKind::Fine {
            resolution = buffered_resolution(
                resolution,
                self.viewport.window(),
                self.viewport.world(),
                self.config.buffer_frac,
            );
        }
        let settings = self.pass_settings();
        let layout = self.layout();
        plan_pass(
            kind,
            sequence,
            self.viewport.window(),
            self.viewport.transform(),
            resolution,
            &settings,
            &layout,
            &self.store,
            &mut self.cache,
        )
    }
}

/// Builder for configuring a pipeline before construction.
#[derive(Debug)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    screen_width: f64,
    screen_height: f64,
    channels: Vec<Vec<Series>>,
    runtime: Option<Handle>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
            screen_width: 800.0,
            screen_height: 400.0,
            channels: Vec::new(),
            runtime: None,
        }
    }
}

impl PipelineBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the screen size in pixels.
    pub fn screen(mut self, width: f64, height: f64) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    /// Add a channel drawing one or more series.
    pub fn channel(mut self, series: impl IntoIterator<Item = Series>) -> Self {
        self.channels.push(series.into_iter().collect());
        self
    }

    /// Add a channel drawing a single series.
    pub fn series(self, series: Series) -> Self {
        self.channel([series])
    }

    /// Use a specific runtime instead of the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the pipeline and the receiver for fine-pass results.
    pub fn build(self) -> Result<(Pipeline, FineResults)> {
        self.config.validate()?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| PipelineError::NoRuntime)?,
        };

        let world = Range::new(0.0, self.config.world_width_for(self.screen_width));
        let viewport = ViewportModel::new(
            world,
            self.screen_width,
            self.screen_height,
            self.config.max_zoom_scale,
        )?;

        let mut store = SeriesStore::new();
        let mut channels = Vec::with_capacity(self.channels.len());
        for channel in self.channels {
            let ids: Vec<SeriesId> = channel.into_iter().map(|series| store.insert(series)).collect();
            channels.push(ids);
        }

        let (scheduler, results) = RenderScheduler::new(
            runtime,
            self.config.debounce(),
            self.config.worker,
            RenderMetrics::new(),
        );
        debug!(
            "pipeline built: {} series, world {:?}, screen {}x{}",
            store.len(),
            world,
            self.screen_width,
            self.screen_height
        );

        let pipeline = Pipeline {
            cache: LodCache::new(world.span()),
            config: self.config,
            store,
            viewport,
            channels,
            scheduler,
        };
        Ok((pipeline, results))
    }
}
