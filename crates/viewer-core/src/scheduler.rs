//! Single-flight page render scheduler
//!
//! Owns the view state (current page, scale, fit mode) and decides when a page
//! render starts. At most one render is in flight. Requests arriving meanwhile
//! overwrite a single pending slot, so a burst of navigation, zoom or resize
//! events collapses into one trailing render of the latest state.
//!
//! Rendering itself is driven by the caller: every operation that needs a render
//! returns a [`RenderTicket`], and the caller hands the outcome back through
//! [`RenderScheduler::complete`], which may return the trailing ticket.

use crate::config::{ConfigError, ViewerConfig};
use crate::fit::{clamp_scale, compute_fit_scale, round_scale, FitMode, Viewport};
use crate::layout::SurfaceLayout;
use log::{debug, warn};
use pdf_engine::PageSize;

/// Mutable view state. The scheduler is its only writer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Current page, 1-based
    pub current_page: u32,

    /// Display scale
    pub scale: f64,

    pub fit_mode: FitMode,

    /// Latest request deferred behind the in-flight render
    pub pending_page: Option<u32>,

    /// Viewport the fit modes are computed against
    pub viewport: Viewport,

    /// Natural size of the current page, once a render of it has completed
    pub page_size: Option<PageSize>,
}

/// Permission to render one page, issued by the scheduler.
///
/// Carries a snapshot of the view state taken when the render started.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTicket {
    id: u64,
    page: u32,
    scale: f64,
    fit_mode: FitMode,
    viewport: Viewport,
}

impl RenderTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

/// Final parameters for a ticket once the page's natural size is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPlan {
    pub ticket_id: u64,
    pub page: u32,
    pub natural_size: PageSize,
    pub scale: f64,
    pub layout: SurfaceLayout,
}

impl RenderPlan {
    /// Scale to rasterize at, including the device pixel ratio.
    pub fn render_scale(&self) -> f64 {
        self.scale * self.layout.device_pixel_ratio
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered(RenderPlan),
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub renders_started: u64,
    pub renders_completed: u64,
    pub renders_failed: u64,

    /// Requests deferred behind an in-flight render, including overwrites
    pub requests_coalesced: u64,

    /// Completions that did not match the in-flight ticket
    pub stale_completions: u64,
}

pub struct RenderScheduler {
    config: ViewerConfig,
    page_count: u32,
    state: ViewState,
    in_flight: Option<RenderTicket>,
    /// Zoom factor waiting for the current page's fit scale to become known
    deferred_zoom: Option<f64>,
    next_ticket: u64,
    stats: SchedulerStats,
}

impl RenderScheduler {
    /// Create a scheduler for a document of `page_count` pages, starting at page 1.
    ///
    /// # Errors
    /// Returns an error if `config` fails [`ViewerConfig::validate`].
    pub fn new(page_count: u32, config: ViewerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = ViewState {
            current_page: 1,
            scale: clamp_scale(1.0, &config),
            fit_mode: config.initial_fit_mode,
            pending_page: None,
            viewport: Viewport::default(),
            page_size: None,
        };

        Ok(Self {
            config,
            page_count: page_count.max(1),
            state,
            in_flight: None,
            deferred_zoom: None,
            next_ticket: 0,
            stats: SchedulerStats::default(),
        })
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.state.viewport = viewport;
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn current_page(&self) -> u32 {
        self.state.current_page
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn fit_mode(&self) -> FitMode {
        self.state.fit_mode
    }

    pub fn pending_page(&self) -> Option<u32> {
        self.state.pending_page
    }

    pub fn is_render_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&RenderTicket> {
        self.in_flight.as_ref()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats.clone()
    }

    /// Zoom factor held until the fit scale of the current page is known.
    pub fn deferred_zoom(&self) -> Option<f64> {
        self.deferred_zoom
    }

    /// Start rendering `page` now, or defer it behind the in-flight render.
    ///
    /// A deferred request replaces any earlier deferred one. Returns the ticket
    /// only when the render should start immediately.
    pub fn request_render(&mut self, page: u32) -> Option<RenderTicket> {
        let page = page.clamp(1, self.page_count);

        if self.in_flight.is_some() {
            if let Some(previous) = self.state.pending_page.replace(page) {
                debug!("render of page {previous} superseded by page {page}");
            } else {
                debug!("render of page {page} deferred behind in-flight render");
            }
            self.stats.requests_coalesced += 1;
            return None;
        }

        Some(self.start(page))
    }

    fn start(&mut self, page: u32) -> RenderTicket {
        self.next_ticket += 1;

        let ticket = RenderTicket {
            id: self.next_ticket,
            page,
            scale: self.state.scale,
            fit_mode: self.state.fit_mode,
            viewport: self.state.viewport,
        };

        debug!(
            "render #{} started: page {page} at scale {} ({:?})",
            ticket.id, ticket.scale, ticket.fit_mode
        );

        self.stats.renders_started += 1;
        self.in_flight = Some(ticket.clone());
        ticket
    }

    /// Resolve the final scale and surface layout for `ticket`.
    ///
    /// Fit modes are recomputed against the page's natural size and the viewport
    /// captured in the ticket. Custom mode keeps the ticket's scale. The backing
    /// surface stays within `max_backing_pixels`.
    pub fn plan(&self, ticket: &RenderTicket, natural_size: PageSize) -> RenderPlan {
        let scale =
            compute_fit_scale(natural_size, &ticket.viewport, ticket.fit_mode, &self.config)
                .unwrap_or(ticket.scale);

        let layout = SurfaceLayout::with_pixel_budget(
            natural_size,
            scale,
            ticket.viewport.effective_dpr(),
            self.config.max_backing_pixels,
        );

        RenderPlan { ticket_id: ticket.id, page: ticket.page, natural_size, scale, layout }
    }

    /// Record the end of the in-flight render and start the trailing one.
    ///
    /// Failure clears the in-flight flag and leaves the view state alone.
    /// A deferred request is still started either way.
    pub fn complete(
        &mut self,
        ticket: &RenderTicket,
        outcome: RenderOutcome,
    ) -> Option<RenderTicket> {
        if self.in_flight.as_ref().map(RenderTicket::id) != Some(ticket.id) {
            warn!("ignoring completion of render #{} which is not in flight", ticket.id);
            self.stats.stale_completions += 1;
            return None;
        }

        self.in_flight = None;
        let mut rerender = false;

        match outcome {
            RenderOutcome::Rendered(plan) => {
                self.stats.renders_completed += 1;
                debug!(
                    "render #{} finished: page {} at scale {}",
                    ticket.id, plan.page, plan.scale
                );

                if plan.page == self.state.current_page {
                    self.state.page_size = Some(plan.natural_size);
                }

                // A zoom, mode switch or resize since the ticket was issued owns
                // the scale now.
                if ticket.fit_mode.is_fit()
                    && self.state.fit_mode == ticket.fit_mode
                    && self.state.viewport == ticket.viewport
                {
                    self.state.scale = plan.scale;
                }

                if plan.page == self.state.current_page && ticket.fit_mode.is_fit() {
                    if let Some(factor) = self.deferred_zoom.take() {
                        rerender = self.apply_deferred_zoom(plan.scale, factor);
                    }
                }
            }
            RenderOutcome::Failed => {
                self.stats.renders_failed += 1;
                warn!("render #{} of page {} failed", ticket.id, ticket.page);
            }
        }

        if rerender {
            self.state.pending_page = Some(self.state.current_page);
        }

        let pending = self.state.pending_page.take()?;
        debug!("starting trailing render of page {pending}");
        self.request_render(pending)
    }

    /// Multiply the scale by `factor` and switch to custom mode.
    ///
    /// No-op when the rounded, clamped result is within epsilon of the current
    /// scale. While the current page's fit scale is still being computed by an
    /// in-flight or pending render, the factor is held and applied to that fit
    /// scale when the render completes.
    pub fn zoom_by(&mut self, factor: f64) -> Option<RenderTicket> {
        if !(factor.is_finite() && factor > 0.0) {
            warn!("ignoring zoom by invalid factor {factor}");
            return None;
        }

        let factor = factor * self.deferred_zoom.take().unwrap_or(1.0);

        if self.awaiting_fit_scale() {
            debug!(
                "fit scale of page {} unknown, holding zoom by {factor}",
                self.state.current_page
            );
            self.deferred_zoom = Some(factor);
            return None;
        }

        self.set_scale(self.state.scale * factor)
    }

    /// Zoom to an absolute scale, switching to custom mode.
    pub fn set_scale(&mut self, scale: f64) -> Option<RenderTicket> {
        self.deferred_zoom = None;
        let scale = clamp_scale(round_scale(scale, self.config.scale_precision), &self.config);

        if (scale - self.state.scale).abs() < self.config.zoom_epsilon {
            return None;
        }

        self.state.scale = scale;
        self.state.fit_mode = FitMode::Custom;
        self.request_render(self.state.current_page)
    }

    /// Move `delta` pages, clamped to the document. No-op at the boundary.
    pub fn navigate(&mut self, delta: i64) -> Option<RenderTicket> {
        let target = i64::from(self.state.current_page).saturating_add(delta);
        self.go_to_page(target.clamp(1, i64::from(self.page_count)) as u32)
    }

    /// Jump to `page`, clamped to the document. No-op if already there.
    pub fn go_to_page(&mut self, page: u32) -> Option<RenderTicket> {
        let page = page.clamp(1, self.page_count);

        if page == self.state.current_page {
            return None;
        }

        self.state.current_page = page;
        self.state.page_size = None;
        self.request_render(page)
    }

    /// Switch fit policy.
    ///
    /// A fit mode refits against the known page size and re-renders when
    /// anything changed. Custom mode pins the current scale without rendering;
    /// if that scale is still being fitted, it is pinned once the render lands.
    pub fn set_fit_mode(&mut self, mode: FitMode) -> Option<RenderTicket> {
        if !mode.is_fit() {
            if self.awaiting_fit_scale() {
                self.deferred_zoom.get_or_insert(1.0);
            } else {
                self.deferred_zoom = None;
                self.state.fit_mode = mode;
            }
            return None;
        }

        let previous_mode = self.state.fit_mode;
        let previous_scale = self.state.scale;

        self.deferred_zoom = None;
        self.state.fit_mode = mode;

        self.refit();

        let unchanged = (self.state.scale - previous_scale).abs() < self.config.zoom_epsilon;
        if previous_mode == mode && unchanged {
            return None;
        }

        self.request_render(self.state.current_page)
    }

    /// Adopt a new viewport and re-render the current page.
    ///
    /// Fit modes recompute the scale. Custom mode keeps it but still re-renders
    /// so the bitmap matches the new surface and pixel ratio.
    pub fn on_viewport_resize(&mut self, viewport: Viewport) -> Option<RenderTicket> {
        self.state.viewport = viewport;

        if self.state.fit_mode.is_fit() {
            self.refit();
        }

        self.request_render(self.state.current_page)
    }

    /// A fit mode is active but the current page's size, and so its fit scale,
    /// is not known yet while a render that will learn it is outstanding.
    fn awaiting_fit_scale(&self) -> bool {
        self.state.fit_mode.is_fit() && self.state.page_size.is_none() && self.in_flight.is_some()
    }

    /// Apply a held zoom to the fit scale a render just produced.
    ///
    /// Returns `true` when the page must be rendered again at the new scale.
    fn apply_deferred_zoom(&mut self, fit_scale: f64, factor: f64) -> bool {
        let scale = clamp_scale(
            round_scale(fit_scale * factor, self.config.scale_precision),
            &self.config,
        );

        let changed = (scale - fit_scale).abs() >= self.config.zoom_epsilon;

        // A factor of exactly 1 comes from pinning the fitted scale.
        if changed || factor == 1.0 {
            debug!("applying held zoom by {factor} to fit scale {fit_scale}: {scale}");
            self.state.fit_mode = FitMode::Custom;
            self.state.scale = scale;
        }

        changed
    }

    fn refit(&mut self) {
        let Some(size) = self.state.page_size else {
            return;
        };

        if let Some(scale) =
            compute_fit_scale(size, &self.state.viewport, self.state.fit_mode, &self.config)
        {
            self.state.scale = scale;
        }
    }
}
