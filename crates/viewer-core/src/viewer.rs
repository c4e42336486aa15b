//! Single-threaded viewer host
//!
//! Runs a cooperative event loop over queued input and the one outstanding render
//! task. Handlers run one at a time, each to completion, so the scheduler's state
//! never sees interleaved writers. Queued input is handled before the render task
//! is driven, modelling rasterization that is slower than an input burst: every
//! event already waiting when a render starts sees that render in flight.

use crate::config::ViewerConfig;
use crate::error::{ViewerError, ViewerResult};
use crate::fit::Viewport;
use crate::indicator::StatusIndicator;
use crate::input::{InputEvent, InputTranslator, ViewerAction};
use crate::layout::SurfaceLayout;
use crate::scheduler::{
    RenderOutcome, RenderPlan, RenderScheduler, RenderTicket, SchedulerStats,
};
use log::{debug, error, warn};
use pdf_engine::{DocumentHandle, OpenSource, PdfEngine, PdfEngineError, Surface};
use std::collections::VecDeque;

/// What the surface currently shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedFrame {
    pub page: u32,
    pub scale: f64,
    pub layout: SurfaceLayout,
}

enum Session {
    Empty,
    Ready { document: DocumentHandle, scheduler: RenderScheduler },
    Failed,
}

pub struct Viewer<E: PdfEngine> {
    engine: E,
    config: ViewerConfig,
    translator: InputTranslator,
    viewport: Viewport,
    session: Session,
    inputs: VecDeque<InputEvent>,
    render_task: Option<RenderTicket>,
    /// What is on screen; only replaced by a successful render
    surface: Surface,
    /// Render target, swapped with `surface` on success
    back_buffer: Surface,
    indicator: StatusIndicator,
    last_frame: Option<RenderedFrame>,
}

impl<E: PdfEngine> Viewer<E> {
    /// # Errors
    /// Returns [`ViewerError::Config`] if `config` fails validation.
    pub fn new(engine: E, config: ViewerConfig) -> ViewerResult<Self> {
        config.validate()?;

        Ok(Self {
            engine,
            translator: InputTranslator::new(&config),
            config,
            viewport: Viewport::default(),
            session: Session::Empty,
            inputs: VecDeque::new(),
            render_task: None,
            surface: Surface::default(),
            back_buffer: Surface::default(),
            indicator: StatusIndicator::new(),
            last_frame: None,
        })
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Open a document and queue the first page.
    ///
    /// A previously open document is closed and its render task dropped.
    /// A failed load replaces the page indicator with the failure and halts the
    /// viewer; every later call is rejected.
    pub fn load(&mut self, source: impl Into<OpenSource>) -> ViewerResult<()> {
        if matches!(self.session, Session::Failed) {
            return Err(ViewerError::Halted);
        }

        let previous = std::mem::replace(&mut self.session, Session::Empty);
        if let Session::Ready { document, .. } = previous {
            if let Err(err) = self.engine.close(document) {
                warn!("failed to close previous document: {err}");
            }
            self.render_task = None;
            self.last_frame = None;
        }

        let opened = self.engine.open(source.into()).and_then(|document| {
            let page_count = self.engine.page_count(document)?;
            Ok((document, page_count))
        });

        let (document, page_count) = match opened {
            Ok(opened) => opened,
            Err(err) => {
                error!("document load failed: {err}");
                self.session = Session::Failed;
                self.inputs.clear();
                self.render_task = None;
                self.indicator.show_load_failure(err.to_string());
                return Err(ViewerError::DocumentLoad(err));
            }
        };

        debug!("document loaded with {page_count} pages");

        let mut scheduler =
            RenderScheduler::new(page_count, self.config.clone())?.with_viewport(self.viewport);
        let first = scheduler.request_render(1);

        self.indicator.clear_error();
        self.indicator.show_page(scheduler.current_page(), scheduler.page_count());
        self.session = Session::Ready { document, scheduler };
        self.enqueue_render(first);

        Ok(())
    }

    /// Queue an input event for the loop.
    pub fn dispatch(&mut self, event: InputEvent) {
        if self.is_halted() {
            debug!("viewer halted, ignoring {event:?}");
            return;
        }
        self.inputs.push_back(event);
    }

    /// Handle the oldest queued input, or drive the render task when no input is
    /// waiting. Returns `false` when there was nothing to do.
    pub fn step(&mut self) -> bool {
        if let Some(input) = self.inputs.pop_front() {
            self.handle_input(input);
            return true;
        }

        self.finish_render()
    }

    /// Run the outstanding render to completion now, ahead of queued input.
    ///
    /// Returns `false` when no render was outstanding.
    pub fn finish_render(&mut self) -> bool {
        let Some(ticket) = self.render_task.take() else {
            return false;
        };

        self.execute(ticket);
        true
    }

    /// Drain queued input and every render started along the way.
    ///
    /// Returns the number of steps taken.
    pub fn run_until_idle(&mut self) -> usize {
        let mut handled = 0;
        while self.step() {
            handled += 1;
        }
        handled
    }

    pub fn queued_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn render_task(&self) -> Option<&RenderTicket> {
        self.render_task.as_ref()
    }

    pub fn scheduler(&self) -> Option<&RenderScheduler> {
        match &self.session {
            Session::Ready { scheduler, .. } => Some(scheduler),
            Session::Empty | Session::Failed => None,
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        self.scheduler().map(RenderScheduler::stats).unwrap_or_default()
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.session, Session::Failed)
    }

    pub fn indicator(&self) -> &StatusIndicator {
        &self.indicator
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn last_frame(&self) -> Option<&RenderedFrame> {
        self.last_frame.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn handle_input(&mut self, input: InputEvent) {
        let Some(action) = self.translator.translate(input) else {
            return;
        };

        if let ViewerAction::Refit(viewport) = action {
            self.viewport = viewport;
        }

        let Session::Ready { scheduler, .. } = &mut self.session else {
            debug!("no document open, dropping {action:?}");
            return;
        };

        let ticket = match action {
            ViewerAction::Navigate(delta) => scheduler.navigate(delta),
            ViewerAction::FirstPage => scheduler.go_to_page(1),
            ViewerAction::LastPage => {
                let last = scheduler.page_count();
                scheduler.go_to_page(last)
            }
            ViewerAction::ZoomBy(factor) => scheduler.zoom_by(factor),
            ViewerAction::SetFitMode(mode) => scheduler.set_fit_mode(mode),
            ViewerAction::Refit(viewport) => scheduler.on_viewport_resize(viewport),
        };

        self.indicator.show_page(scheduler.current_page(), scheduler.page_count());
        self.enqueue_render(ticket);
    }

    fn execute(&mut self, ticket: RenderTicket) {
        let Session::Ready { document, scheduler } = &mut self.session else {
            return;
        };

        let rendered =
            render_ticket(&self.engine, *document, scheduler, &ticket, &mut self.back_buffer);

        let outcome = match rendered {
            Ok(plan) => {
                std::mem::swap(&mut self.surface, &mut self.back_buffer);
                self.last_frame =
                    Some(RenderedFrame { page: plan.page, scale: plan.scale, layout: plan.layout });
                self.indicator.clear_error();
                RenderOutcome::Rendered(plan)
            }
            Err(source) => {
                let err = ViewerError::PageRender { page: ticket.page(), source };
                warn!("{err}");
                self.indicator.set_error(err.to_string());
                RenderOutcome::Failed
            }
        };

        let next = scheduler.complete(&ticket, outcome);
        self.indicator.show_page(scheduler.current_page(), scheduler.page_count());
        self.enqueue_render(next);
    }

    fn enqueue_render(&mut self, ticket: Option<RenderTicket>) {
        if let Some(ticket) = ticket {
            debug_assert!(self.render_task.is_none(), "scheduler issued overlapping renders");
            self.render_task = Some(ticket);
        }
    }
}

fn render_ticket<E: PdfEngine>(
    engine: &E,
    document: DocumentHandle,
    scheduler: &RenderScheduler,
    ticket: &RenderTicket,
    surface: &mut Surface,
) -> Result<RenderPlan, PdfEngineError> {
    let page = engine.page(document, ticket.page())?;
    let natural_size = engine.natural_size(page)?;
    let plan = scheduler.plan(ticket, natural_size);

    surface.resize(plan.layout.backing_width, plan.layout.backing_height);
    engine.render(page, plan.render_scale() as f32, surface)?;

    Ok(plan)
}
