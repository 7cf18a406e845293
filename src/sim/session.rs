//! Game session state machine
//!
//! Owns every entity and drives one game of `sets_per_session` sets:
//!
//! ```text
//! Idle --start--> InSet --answer/floor--> Resolving --clear--> InSet (next set)
//!                                                   \--------> Finished --reset--> Idle
//! ```
//!
//! The host feeds three event sources into it: pointer input (drained from the
//! renderer in `frame`), animation frames (`frame`), and the fixed-period
//! collision timer (`collision_tick`). Delayed effects run on the internal
//! scheduler against the host clock passed to `frame`/`advance_clock`.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::animation::{AnimationTask, FrameRequest};
use super::collision::detect;
use super::entity::{Corner, Entity};
use super::gesture::{DragGesture, DragUpdate};
use super::schedule::Scheduler;
use crate::config::{GameConfig, ImageEntry};
use crate::error::{GameError, Result};
use crate::platform::{ElementHandle, ElementSpec, PointerInput, PointerKind, Renderer, StyleMap, px};
use crate::ui::{self, ModalContent};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Start modal shown, waiting for `start`
    Idle,
    /// Card falling and draggable
    InSet,
    /// Answer locked in, result animating
    Resolving,
    /// All sets played, results being shown
    Finished,
}

/// Things that happened, drained by the host with `take_events`
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Start modal is up (welcome, or retry with the last score)
    SessionReady { retry_score: Option<i32> },
    SetStarted { set: u32, nationality: String },
    AnswerSelected { corner: Corner },
    /// Card hit the bottom boundary before an answer
    FloorReached,
    SetResolved {
        set: u32,
        correct: bool,
        delta: i32,
        score: i32,
    },
    ResultsShown { score: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerAction {
    CheckAnswer(Corner),
    ClearSet,
}

/// An entity and the element that renders it
#[derive(Debug, Clone)]
pub struct Placed {
    pub entity: Entity,
    pub handle: ElementHandle,
}

/// Elements that live for a whole session
#[derive(Debug)]
struct World {
    header: ElementHandle,
    modal: ElementHandle,
    targets: Vec<Placed>,
    boundary: Placed,
}

impl World {
    fn target_at(&self, corner: Corner) -> Option<&Placed> {
        self.targets.iter().find(|t| t.entity.corner() == Some(corner))
    }
}

fn allocate_id(next_id: &mut u32) -> u32 {
    let id = *next_id;
    *next_id += 1;
    id
}

/// Create page skeleton, corner targets, floor line and modal
fn build_world<R: Renderer>(
    config: &GameConfig,
    renderer: &mut R,
    next_id: &mut u32,
) -> Result<World> {
    let mounts = &config.mounts;

    let header = renderer.create_element(
        &mounts.root,
        &ElementSpec::new("header")
            .classes("page-header")
            .attr("id", "header"),
    )?;
    renderer.create_element(
        &mounts.root,
        &ElementSpec::new("main")
            .classes("gameplay-area")
            .attr("id", mounts.play_area.as_str()),
    )?;

    let viewport = renderer.viewport();
    let size = config.target_size;
    let margin = config.target_margin;
    let mut targets = Vec::with_capacity(config.targets.len());
    for spec in &config.targets {
        let left = if spec.corner.is_left() {
            margin
        } else {
            viewport.x - margin - size.x
        };
        let top = if spec.corner.is_top() {
            margin
        } else {
            viewport.y - margin - size.y
        };
        let handle = renderer.create_element(
            &mounts.play_area,
            &ElementSpec::new("div")
                .classes(&format!("box target-box {}", spec.corner.as_str()))
                .attr("id", format!("nat-{}", spec.nationality))
                .styles(
                    StyleMap::new()
                        .with("position", "absolute")
                        .with("left", px(left))
                        .with("top", px(top))
                        .with("width", px(size.x))
                        .with("height", px(size.y)),
                ),
        )?;
        renderer.render(handle, &ui::target_html(&spec.flag_url, &spec.nationality));

        let mut entity = Entity::fixed(allocate_id(next_id), &spec.nationality, spec.corner);
        entity.refresh(renderer.query_layout_box(handle));
        targets.push(Placed { entity, handle });
    }

    let line = renderer.create_element(
        &mounts.play_area,
        &ElementSpec::new("div")
            .classes("bottom-line")
            .attr("id", "line")
            .styles(
                StyleMap::new()
                    .with("position", "absolute")
                    .with("bottom", "0px")
                    .with("left", "0px")
                    .with("width", "100%")
                    .with("height", "0px"),
            ),
    )?;
    let mut boundary = Entity::boundary(allocate_id(next_id));
    boundary.refresh(renderer.query_layout_box(line));

    let modal = renderer.create_element(
        &mounts.play_area,
        &ElementSpec::new("div")
            .classes("modal")
            .styles(StyleMap::new().with("display", "none")),
    )?;

    Ok(World {
        header,
        modal,
        targets,
        boundary: Placed {
            entity: boundary,
            handle: line,
        },
    })
}

fn card_spec(config: &GameConfig, image: &ImageEntry) -> ElementSpec {
    ElementSpec::new("div")
        .classes("box border-grad")
        .attr("id", "picture-frame")
        .styles(
            StyleMap::new()
                .with("position", "absolute")
                .with("width", px(config.card_size.x))
                .with("height", px(config.card_size.y))
                .with("top", "0px")
                .with("left", format!("{}%", config.card_left_fraction * 100.0))
                .with("background-image", format!("url(\"{}\")", ui::escape(&image.url)))
                .with("background-size", "cover")
                .with("touch-action", "none"),
        )
}

pub struct Session<R: Renderer> {
    config: GameConfig,
    renderer: R,
    phase: SessionPhase,
    score: i32,
    sets_played: u32,
    image_queue: VecDeque<ImageEntry>,
    rng: Option<Pcg32>,
    world: World,
    card: Option<Placed>,
    gesture: DragGesture,
    animation: Option<AnimationTask>,
    /// Set once the current card has been scored
    resolved: bool,
    timers: Scheduler<(u64, TimerAction)>,
    /// Bumped on teardown; timers from older generations are dropped
    generation: u64,
    next_entity_id: u32,
    next_task_id: u64,
    events: Vec<GameEvent>,
}

impl<R: Renderer> Session<R> {
    /// Validate the config, build the world and show the welcome modal
    pub fn new(config: GameConfig, mut renderer: R) -> Result<Self> {
        config.validate()?;

        let mut next_entity_id = 1;
        let world = build_world(&config, &mut renderer, &mut next_entity_id)?;
        let mut rng = config.shuffle_seed.map(Pcg32::seed_from_u64);
        let image_queue = config.image_queue(rng.as_mut());
        let gesture = DragGesture::new(config.drag_threshold);

        let mut session = Self {
            config,
            renderer,
            phase: SessionPhase::Idle,
            score: 0,
            sets_played: 0,
            image_queue,
            rng,
            world,
            card: None,
            gesture,
            animation: None,
            resolved: false,
            timers: Scheduler::new(),
            generation: 0,
            next_entity_id,
            next_task_id: 0,
            events: Vec::new(),
        };
        session.show_modal(ModalContent::Welcome);
        session.events.push(GameEvent::SessionReady { retry_score: None });
        log::info!(
            "Session ready: {} sets, {} images",
            session.config.sets_per_session,
            session.image_queue.len()
        );
        Ok(session)
    }

    // === Host entry points ===

    /// Leave the start modal and begin the first set
    pub fn start(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Idle {
            log::warn!("start ignored while {:?}", self.phase);
            return Ok(());
        }
        self.hide_modal();
        log::info!("Session started");
        self.start_set()
    }

    /// Tear everything down and return to the start modal.
    ///
    /// `final_score` selects the retry modal over the welcome one. Score and
    /// set count go back to zero and the image queue is refilled.
    ///
    /// The session is back in `Idle` even when rebuilding the page fails, so a
    /// later `start` reports the renderer error instead of being ignored.
    pub fn reset(&mut self, final_score: Option<i32>) -> Result<()> {
        self.teardown();
        self.image_queue = self.config.image_queue(self.rng.as_mut());
        self.score = 0;
        self.sets_played = 0;
        self.phase = SessionPhase::Idle;

        self.renderer.remove_all_under_mount(&self.config.mounts.root);
        self.world = build_world(&self.config, &mut self.renderer, &mut self.next_entity_id)?;
        self.show_modal(ModalContent::for_final_score(final_score));
        self.events.push(GameEvent::SessionReady {
            retry_score: final_score,
        });
        log::info!("Session reset");
        Ok(())
    }

    /// Cancel the animation task and every pending timer, remove the card
    pub fn teardown(&mut self) {
        let dropped = self.timers.cancel_all();
        if dropped > 0 {
            log::debug!("Teardown cancelled {} pending timers", dropped);
        }
        self.generation += 1;
        self.stop_animation();
        if let Some(card) = self.card.take() {
            self.renderer.remove_element(card.handle);
        }
        self.gesture.reset();
        self.resolved = false;
    }

    /// One animation frame: pointer input, card fall, due timers
    pub fn frame(&mut self, now_ms: f64) -> FrameRequest {
        self.pump_input();
        let request = self.animation_frame();
        self.advance_clock(now_ms);
        request
    }

    /// Dispatch pointer events received by the renderer
    pub fn pump_input(&mut self) {
        for input in self.renderer.drain_pointer_events() {
            self.handle_pointer(input);
        }
    }

    /// Run timers that are due at `now_ms`
    pub fn advance_clock(&mut self, now_ms: f64) {
        loop {
            let due = self.timers.advance_to(now_ms);
            if due.is_empty() {
                break;
            }
            for (generation, action) in due {
                if generation != self.generation {
                    log::debug!("Dropping stale timer {:?}", action);
                    continue;
                }
                match action {
                    TimerAction::CheckAnswer(corner) => {
                        self.check_answer(Some(corner));
                    }
                    TimerAction::ClearSet => self.clear_game_world(),
                }
            }
        }
    }

    // === Sets ===

    fn start_set(&mut self) -> Result<()> {
        let Some(image) = self.image_queue.front().cloned() else {
            return Err(GameError::ManifestTooShort {
                needed: self.config.sets_per_session as usize,
                available: self.sets_played as usize,
            });
        };

        let handle = self
            .renderer
            .create_element(&self.config.mounts.play_area, &card_spec(&self.config, &image))?;
        if let Err(e) = self.renderer.subscribe_pointer(handle) {
            self.renderer.remove_element(handle);
            return Err(e);
        }
        self.image_queue.pop_front();
        self.sets_played += 1;

        let mut entity = Entity::moving(allocate_id(&mut self.next_entity_id), &image.nationality);
        entity.refresh(self.renderer.query_layout_box(handle));
        if let Some(card) = entity.as_moving_mut() {
            card.active = true;
        }
        self.card = Some(Placed { entity, handle });

        self.gesture.reset();
        self.resolved = false;
        self.next_task_id += 1;
        self.animation = Some(AnimationTask::start(self.next_task_id, self.config.fall_step));
        self.phase = SessionPhase::InSet;
        self.update_scoreboard();

        log::info!(
            "Set {}/{} started ({})",
            self.sets_played,
            self.config.sets_per_session,
            image.nationality
        );
        self.events.push(GameEvent::SetStarted {
            set: self.sets_played,
            nationality: image.nationality,
        });
        Ok(())
    }

    /// Advance the card's fall by one frame
    pub fn animation_frame(&mut self) -> FrameRequest {
        let (Some(task), Some(card)) = (self.animation.as_mut(), self.card.as_mut()) else {
            return FrameRequest::Stop;
        };
        let edges = card.entity.geometry.edges;
        let Some(moving) = card.entity.as_moving_mut() else {
            return FrameRequest::Stop;
        };

        let (request, moved) = task.step(moving, &edges);
        if let Some(pos) = moved {
            self.renderer.set_inline_styles(
                card.handle,
                &StyleMap::new().with("top", px(pos.y)).with("left", px(pos.x)),
            );
            card.entity.refresh(self.renderer.query_layout_box(card.handle));
        }
        if request == FrameRequest::Stop {
            self.animation = None;
        }
        request
    }

    fn stop_animation(&mut self) {
        if let Some(mut task) = self.animation.take() {
            task.cancel();
        }
    }

    /// Feed one pointer event to the drag gesture
    pub fn handle_pointer(&mut self, input: PointerInput) {
        if self.phase != SessionPhase::InSet {
            log::trace!("Pointer {:?} ignored while {:?}", input.kind, self.phase);
            return;
        }
        let Some(card) = self.card.as_mut() else {
            return;
        };
        if card.handle != input.target {
            log::debug!("Pointer event for stale element {:?}", input.target);
            return;
        }
        let Some(moving) = card.entity.as_moving_mut() else {
            return;
        };
        if !moving.active {
            return;
        }

        let committed = match input.kind {
            PointerKind::Down => {
                self.gesture.begin(input.offset);
                moving.dragging = self.gesture.is_dragging();
                None
            }
            PointerKind::Up => {
                self.gesture.end();
                moving.dragging = false;
                None
            }
            PointerKind::Move => match self.gesture.update(input.client, input.movement) {
                DragUpdate::Ignored => None,
                DragUpdate::Track(pos) => {
                    self.renderer.set_inline_styles(
                        card.handle,
                        &StyleMap::new().with("top", px(pos.y)).with("left", px(pos.x)),
                    );
                    card.entity.refresh(self.renderer.query_layout_box(card.handle));
                    None
                }
                DragUpdate::Commit(corner) => {
                    moving.dragging = false;
                    moving.active = false;
                    Some(corner)
                }
            },
        };

        if let Some(corner) = committed {
            self.commit_answer(corner);
        }
    }

    /// Lock in a gesture answer and send the card to its target
    fn commit_answer(&mut self, corner: Corner) {
        if self.phase != SessionPhase::InSet {
            return;
        }
        self.phase = SessionPhase::Resolving;
        self.stop_animation();
        log::debug!("Answer selected: {}", corner.as_str());
        self.events.push(GameEvent::AnswerSelected { corner });
        self.animate_to_answer_box(corner);
        self.schedule(self.config.answer_travel_ms, TimerAction::CheckAnswer(corner));
    }

    fn animate_to_answer_box(&mut self, corner: Corner) {
        let Some(target) = self.world.target_at(corner) else {
            return;
        };
        let Some(card) = self.card.as_mut() else {
            return;
        };

        let t = target.entity.geometry;
        let c = card.entity.geometry;
        let scale = if c.height() > 0.0 {
            t.height() / c.height()
        } else {
            1.0
        };
        let styles = StyleMap::new()
            .with("top", px(t.center.y - c.height() / 2.0))
            .with("left", px(t.center.x - c.width() / 2.0))
            .with("transform", format!("scale({})", scale))
            .with(
                "transition",
                format!("all {}s ease-out", self.config.answer_travel_ms / 1000.0),
            )
            .with("animation-play-state", "paused");
        self.renderer.set_inline_styles(card.handle, &styles);
        card.entity.refresh(self.renderer.query_layout_box(card.handle));
    }

    /// Collision sampling, run by the host every `collision_interval_ms`.
    ///
    /// Checks the card against the primary target (or all targets when
    /// `collide_all_targets` is set) and the floor. Touching the floor
    /// resolves the set as a wrong answer.
    pub fn collision_tick(&mut self) {
        if self.phase != SessionPhase::InSet {
            return;
        }
        let Some(card) = self.card.as_mut() else {
            return;
        };
        if !card.entity.as_moving().is_some_and(|c| c.active) {
            return;
        }
        card.entity.refresh(self.renderer.query_layout_box(card.handle));

        let checked = if self.config.collide_all_targets {
            self.world.targets.len()
        } else {
            1
        };
        for target in self.world.targets.iter_mut().take(checked) {
            if detect(&mut card.entity, &mut target.entity).hit {
                log::trace!("Card touching target {:?}", target.entity.corner());
            }
        }

        if !detect(&mut card.entity, &mut self.world.boundary.entity).hit {
            return;
        }
        if let Some(moving) = card.entity.as_moving_mut() {
            moving.active = false;
            moving.dragging = false;
        }
        log::info!("Card reached the floor");
        self.events.push(GameEvent::FloorReached);
        self.phase = SessionPhase::Resolving;
        self.stop_animation();
        self.check_answer(None);
    }

    /// Score the current card against the target at `selected`.
    ///
    /// `None` (floor timeout) always scores as wrong. Returns the verdict, or
    /// None when there is nothing left to score.
    pub fn check_answer(&mut self, selected: Option<Corner>) -> Option<bool> {
        if self.resolved
            || !matches!(self.phase, SessionPhase::InSet | SessionPhase::Resolving)
        {
            log::debug!("check_answer ignored while {:?}", self.phase);
            return None;
        }
        let card = self.card.as_mut()?;
        let nationality = card.entity.nationality()?.to_string();
        if let Some(moving) = card.entity.as_moving_mut() {
            moving.active = false;
            moving.dragging = false;
        }
        let handle = card.handle;

        let correct = selected
            .and_then(|corner| self.config.target_at(corner))
            .is_some_and(|t| t.nationality == nationality);

        self.resolved = true;
        self.phase = SessionPhase::Resolving;
        self.stop_animation();

        let delta = if correct {
            self.config.correct_points
        } else {
            self.config.wrong_points
        };
        self.score += delta;
        self.update_scoreboard();
        self.show_result_animation(handle, correct);

        log::info!(
            "Set {} {} ({:+}), score {}",
            self.sets_played,
            if correct { "correct" } else { "wrong" },
            delta,
            self.score
        );
        self.events.push(GameEvent::SetResolved {
            set: self.sets_played,
            correct,
            delta,
            score: self.score,
        });
        self.schedule(self.config.result_delay_ms, TimerAction::ClearSet);
        Some(correct)
    }

    fn show_result_animation(&mut self, handle: ElementHandle, correct: bool) {
        let styles = StyleMap::new()
            .with("transform", "scale(0.5)")
            .with("border-color", if correct { "green" } else { "red" })
            .with("border-width", "20px")
            .with("opacity", "0")
            .with(
                "transition",
                format!("all {}s ease-out", self.config.result_delay_ms / 1000.0),
            );
        self.renderer.set_inline_styles(handle, &styles);
    }

    /// Remove the card, then start the next set or finish the session
    pub fn clear_game_world(&mut self) {
        self.stop_animation();
        if let Some(card) = self.card.take() {
            self.renderer.remove_element(card.handle);
        }
        self.gesture.reset();

        if self.sets_played >= self.config.sets_per_session {
            self.display_results();
        } else if let Err(e) = self.start_set() {
            log::error!("Could not start set {}: {}", self.sets_played + 1, e);
            self.display_results();
        }
    }

    fn display_results(&mut self) {
        let score = self.score;
        self.phase = SessionPhase::Finished;
        log::info!(
            "Session finished after {} sets, score {}",
            self.sets_played,
            score
        );
        self.events.push(GameEvent::ResultsShown { score });
        if let Err(e) = self.reset(Some(score)) {
            log::error!("Reset after results failed: {}", e);
        }
    }

    // === View helpers ===

    fn schedule(&mut self, delay_ms: f64, action: TimerAction) {
        self.timers.set_timeout(delay_ms, (self.generation, action));
    }

    fn update_scoreboard(&mut self) {
        let html = ui::scoreboard_html(self.sets_played, self.config.sets_per_session, self.score);
        self.renderer.render(self.world.header, &html);
    }

    fn show_modal(&mut self, content: ModalContent) {
        self.renderer
            .set_inline_styles(self.world.modal, &StyleMap::new().with("display", "block"));
        self.renderer.render(self.world.modal, &content.html());
    }

    fn hide_modal(&mut self) {
        self.renderer
            .set_inline_styles(self.world.modal, &StyleMap::new().with("display", "none"));
    }

    // === Accessors ===

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn sets_played(&self) -> u32 {
        self.sets_played
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn card(&self) -> Option<&Placed> {
        self.card.as_ref()
    }

    pub fn targets(&self) -> &[Placed] {
        &self.world.targets
    }

    pub fn boundary(&self) -> &Placed {
        &self.world.boundary
    }

    pub fn modal_handle(&self) -> ElementHandle {
        self.world.modal
    }

    pub fn header_handle(&self) -> ElementHandle {
        self.world.header
    }

    pub fn images_remaining(&self) -> usize {
        self.image_queue.len()
    }

    pub fn animation_running(&self) -> bool {
        self.animation.as_ref().is_some_and(|t| t.is_running())
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn now(&self) -> f64 {
        self.timers.now()
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::platform::{HeadlessClock, HeadlessRenderer, run_for};

    const NATIONALITIES: [&str; 4] = ["japanese", "chineese", "korean", "thai"];

    fn config_with(nationalities: &[&str]) -> GameConfig {
        GameConfig {
            manifest: (0..10)
                .map(|i| {
                    let nat = nationalities[i % nationalities.len()];
                    ImageEntry::new(nat, &format!("images/{}/{}.jpg", nat, i))
                })
                .collect(),
            ..GameConfig::default()
        }
    }

    fn new_session(config: GameConfig) -> Session<HeadlessRenderer> {
        Session::new(config, HeadlessRenderer::new(800.0, 600.0)).unwrap()
    }

    fn clock() -> HeadlessClock {
        HeadlessClock::new(16.0, 100.0)
    }

    /// Press on the card's center and flick it toward `corner`
    fn flick(session: &mut Session<HeadlessRenderer>, clock: &mut HeadlessClock, corner: Corner) {
        let card = session.card().unwrap();
        let handle = card.handle;
        let edges = card.entity.geometry.edges;
        let sx = if corner.is_left() { -1.0 } else { 1.0 };
        let sy = if corner.is_top() { -1.0 } else { 1.0 };
        let offset = Vec2::new(75.0, 100.0);
        session.renderer_mut().push_drag(
            handle,
            Vec2::new(edges.left, edges.top) + offset,
            offset,
            &[Vec2::new(5.0 * sx, 5.0 * sy), Vec2::new(5.0 * sx, 20.0 * sy)],
            false,
        );
        run_for(session, clock, 16.0);
    }

    fn corner_of(session: &Session<HeadlessRenderer>, nationality: &str) -> Corner {
        session
            .targets()
            .iter()
            .find(|t| t.entity.nationality() == Some(nationality))
            .and_then(|t| t.entity.corner())
            .unwrap()
    }

    fn current_nationality(session: &Session<HeadlessRenderer>) -> String {
        session.card().unwrap().entity.nationality().unwrap().to_string()
    }

    fn modal_style(session: &Session<HeadlessRenderer>) -> Option<String> {
        let modal = session.renderer().element(session.modal_handle()).unwrap();
        modal.styles.get("display").map(str::to_string)
    }

    #[test]
    fn test_new_session_shows_welcome() {
        let mut session = new_session(GameConfig::default());
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.score(), 0);
        assert_eq!(session.images_remaining(), 30);
        assert_eq!(
            session.take_events(),
            vec![GameEvent::SessionReady { retry_score: None }]
        );

        let modal = session.renderer().element(session.modal_handle()).unwrap();
        assert!(modal.html.contains("Welcome"));
        assert_eq!(modal_style(&session).as_deref(), Some("block"));

        let r = session.renderer();
        for nat in NATIONALITIES {
            assert!(r.element_by_id(&format!("nat-{}", nat)).is_some());
        }
        let floor = session.boundary().entity.geometry;
        assert_eq!(floor.edges.top, 600.0);
        assert_eq!(floor.width(), 800.0);

        let top_right = session.targets()[1].entity.geometry.edges;
        assert_eq!((top_right.left, top_right.top), (616.0, 24.0));
    }

    #[test]
    fn test_missing_mount_fails() {
        let result = Session::new(
            GameConfig::default(),
            HeadlessRenderer::with_mounts(800.0, 600.0, &[]),
        );
        assert!(matches!(result, Err(GameError::MountMissing(m)) if m == "page-wrapper"));
    }

    #[test]
    fn test_short_manifest_fails() {
        let mut config = GameConfig::default();
        config.manifest.truncate(3);
        let result = Session::new(config, HeadlessRenderer::new(800.0, 600.0));
        assert!(matches!(
            result,
            Err(GameError::ManifestTooShort {
                needed: 10,
                available: 3
            })
        ));
    }

    #[test]
    fn test_start_spawns_falling_card() {
        let mut session = new_session(config_with(&["korean"]));
        session.take_events();
        session.start().unwrap();
        session.start().unwrap();

        assert_eq!(session.phase(), SessionPhase::InSet);
        assert_eq!(session.sets_played(), 1);
        assert_eq!(
            session.take_events(),
            vec![GameEvent::SetStarted {
                set: 1,
                nationality: "korean".into()
            }]
        );
        assert_eq!(modal_style(&session).as_deref(), Some("none"));

        let r = session.renderer();
        let header = r.element(session.header_handle()).unwrap();
        assert!(header.html.contains("set ( 1 / 10 )"));
        let card = r.element(session.card().unwrap().handle).unwrap();
        assert_eq!(card.id(), Some("picture-frame"));
        assert!(card.styles.get("background-image").unwrap().contains("images/korean/0.jpg"));

        let start = session.card().unwrap().entity.geometry.edges;
        assert_eq!((start.left, start.top), (320.0, 0.0));
        for frame in 1..=10 {
            assert_eq!(session.frame(frame as f64 * 16.0), FrameRequest::Continue);
        }
        let edges = session.card().unwrap().entity.geometry.edges;
        assert_eq!((edges.left, edges.top), (320.0, 10.0));
        assert!(session.animation_running());
    }

    #[test]
    fn test_correct_answer_scores_and_advances() {
        let mut session = new_session(config_with(&["korean"]));
        let mut clock = clock();
        session.start().unwrap();
        session.take_events();

        flick(&mut session, &mut clock, Corner::BottomLeft);
        assert_eq!(session.phase(), SessionPhase::Resolving);
        assert!(!session.animation_running());
        assert_eq!(session.frame(clock.now()), FrameRequest::Stop);
        assert_eq!(
            session.take_events(),
            vec![GameEvent::AnswerSelected {
                corner: Corner::BottomLeft
            }]
        );

        run_for(&mut session, &mut clock, 700.0);
        assert_eq!(session.score(), 20);
        assert_eq!(
            session.take_events(),
            vec![GameEvent::SetResolved {
                set: 1,
                correct: true,
                delta: 20,
                score: 20
            }]
        );
        let card = session.renderer().element(session.card().unwrap().handle).unwrap();
        assert_eq!(card.styles.get("border-color"), Some("green"));

        run_for(&mut session, &mut clock, 1000.0);
        assert_eq!(session.phase(), SessionPhase::InSet);
        assert_eq!(session.sets_played(), 2);
        assert!(matches!(
            session.take_events().as_slice(),
            [GameEvent::SetStarted { set: 2, .. }]
        ));
        assert_eq!(session.renderer().elements_with_class("border-grad").len(), 1);
    }

    #[test]
    fn test_wrong_answer_penalized() {
        let mut session = new_session(config_with(&["korean"]));
        let mut clock = clock();
        session.start().unwrap();
        flick(&mut session, &mut clock, Corner::TopRight);
        run_for(&mut session, &mut clock, 700.0);

        assert_eq!(session.score(), -5);
        let card = session.renderer().element(session.card().unwrap().handle).unwrap();
        assert_eq!(card.styles.get("border-color"), Some("red"));
    }

    #[test]
    fn test_floor_resolves_as_wrong() {
        let mut session = new_session(config_with(&["thai"]));
        let mut clock = clock();
        session.start().unwrap();
        session.take_events();

        run_for(&mut session, &mut clock, 7000.0);
        let events = session.take_events();
        assert_eq!(events[0], GameEvent::FloorReached);
        assert_eq!(
            events[1],
            GameEvent::SetResolved {
                set: 1,
                correct: false,
                delta: -5,
                score: -5
            }
        );
        assert_eq!(session.phase(), SessionPhase::Resolving);
        let card = session.card().unwrap();
        assert!(card.entity.geometry.edges.bottom >= 600.0);
        assert!(!card.entity.as_moving().unwrap().active);
    }

    #[test]
    fn test_full_session_shows_results_once() {
        let mut session = new_session(config_with(&NATIONALITIES));
        let mut clock = clock();
        session.start().unwrap();

        for set in 0..10 {
            let right = corner_of(&session, &current_nationality(&session));
            let corner = if set % 2 == 0 {
                right
            } else {
                Corner::ALL.into_iter().find(|c| *c != right).unwrap()
            };
            flick(&mut session, &mut clock, corner);
            run_for(&mut session, &mut clock, 1700.0);
        }

        let events = session.take_events();
        let results: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::ResultsShown { .. }))
            .collect();
        assert_eq!(results, vec![&GameEvent::ResultsShown { score: 75 }]);
        assert_eq!(
            events.last(),
            Some(&GameEvent::SessionReady {
                retry_score: Some(75)
            })
        );

        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.score(), 0);
        assert_eq!(session.sets_played(), 0);
        assert_eq!(session.images_remaining(), 10);
        assert!(session.card().is_none());
        assert_eq!(session.pending_timers(), 0);
        let modal = session.renderer().element(session.modal_handle()).unwrap();
        assert!(modal.html.contains("You gained 75 scores."));
        assert_eq!(modal_style(&session).as_deref(), Some("block"));

        session.start().unwrap();
        assert_eq!(session.sets_played(), 1);
    }

    #[test]
    fn test_reset_cancels_pending_resolution() {
        let mut session = new_session(config_with(&["korean"]));
        let mut clock = clock();
        session.start().unwrap();
        flick(&mut session, &mut clock, Corner::BottomLeft);
        assert_eq!(session.pending_timers(), 1);

        session.reset(None).unwrap();
        session.take_events();
        assert_eq!(session.pending_timers(), 0);

        run_for(&mut session, &mut clock, 3000.0);
        assert!(session.take_events().is_empty());
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.score(), 0);
        assert!(session.renderer().elements_with_class("border-grad").is_empty());
        assert_eq!(session.renderer().elements_with_class("target-box").len(), 4);
    }

    #[test]
    fn test_stale_pointer_events_ignored() {
        let mut session = new_session(config_with(&["korean"]));
        let mut clock = clock();
        session.start().unwrap();
        let old = session.card().unwrap().handle;
        flick(&mut session, &mut clock, Corner::BottomLeft);
        run_for(&mut session, &mut clock, 1700.0);
        session.take_events();

        for (kind, movement) in [
            (PointerKind::Down, Vec2::ZERO),
            (PointerKind::Move, Vec2::new(0.0, 50.0)),
        ] {
            session.handle_pointer(PointerInput {
                target: old,
                kind,
                client: Vec2::new(100.0, 100.0),
                offset: Vec2::ZERO,
                movement,
            });
        }
        assert_eq!(session.phase(), SessionPhase::InSet);
        assert!(session.take_events().is_empty());
        let card = session.card().unwrap().entity.as_moving().unwrap();
        assert!(card.active && !card.dragging);
    }

    #[test]
    fn test_set_resolves_once() {
        let mut session = new_session(config_with(&["korean"]));
        let mut clock = clock();
        session.start().unwrap();
        flick(&mut session, &mut clock, Corner::BottomLeft);

        // Locked in: further flicks and collision ticks do nothing
        session.collision_tick();
        let handle = session.card().unwrap().handle;
        session.renderer_mut().push_drag(
            handle,
            Vec2::ZERO,
            Vec2::ZERO,
            &[Vec2::new(0.0, -40.0)],
            true,
        );
        run_for(&mut session, &mut clock, 700.0);
        assert_eq!(session.score(), 20);

        assert_eq!(session.check_answer(Some(Corner::TopLeft)), None);
        assert_eq!(session.check_answer(None), None);
        assert_eq!(session.score(), 20);
        let resolved = session
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::SetResolved { .. }))
            .count();
        assert_eq!(resolved, 1);
    }

    #[test]
    fn test_release_below_threshold_keeps_falling() {
        let mut session = new_session(config_with(&["korean"]));
        let mut clock = clock();
        session.start().unwrap();
        session.take_events();
        let handle = session.card().unwrap().handle;
        let offset = Vec2::new(75.0, 100.0);

        // Nudge and let go before the drag counts as an answer
        session.renderer_mut().push_drag(
            handle,
            Vec2::new(320.0, 0.0) + offset,
            offset,
            &[Vec2::new(3.0, 3.0)],
            true,
        );
        run_for(&mut session, &mut clock, 16.0);
        let card = session.card().unwrap().clone();
        let moving = card.entity.as_moving().unwrap();
        assert!(!moving.dragging && moving.active);
        assert_eq!(session.phase(), SessionPhase::InSet);
        assert!(session.take_events().is_empty());
        // Tracked to (323, 3), then one step of fall
        assert_eq!(card.entity.geometry.edges.left, 323.0);
        assert_eq!(card.entity.geometry.edges.top, 4.0);

        run_for(&mut session, &mut clock, 144.0);
        assert_eq!(session.card().unwrap().entity.geometry.edges.top, 13.0);

        // Held for five frames: no movement, then the fall catches up
        let press = |kind| PointerInput {
            target: handle,
            kind,
            client: Vec2::ZERO,
            offset: Vec2::ZERO,
            movement: Vec2::ZERO,
        };
        session.renderer_mut().push_pointer(press(PointerKind::Down));
        run_for(&mut session, &mut clock, 80.0);
        let card = session.card().unwrap();
        assert!(card.entity.as_moving().unwrap().dragging);
        assert_eq!(card.entity.geometry.edges.top, 13.0);

        session.renderer_mut().push_pointer(press(PointerKind::Up));
        run_for(&mut session, &mut clock, 16.0);
        let card = session.card().unwrap();
        assert!(!card.entity.as_moving().unwrap().dragging);
        assert_eq!(card.entity.geometry.edges.top, 19.0);

        run_for(&mut session, &mut clock, 7000.0);
        let events = session.take_events();
        assert!(events.contains(&GameEvent::FloorReached));
        let resolved: Vec<_> = events
            .into_iter()
            .filter(|e| matches!(e, GameEvent::SetResolved { .. }))
            .collect();
        assert_eq!(
            resolved,
            vec![GameEvent::SetResolved {
                set: 1,
                correct: false,
                delta: -5,
                score: -5
            }]
        );
        assert_eq!(session.score(), -5);
    }

    #[test]
    fn test_failed_reset_still_returns_to_idle() {
        let mut session = new_session(config_with(&["korean"]));
        let mut clock = clock();
        session.start().unwrap();
        flick(&mut session, &mut clock, Corner::BottomLeft);
        run_for(&mut session, &mut clock, 700.0);
        assert_eq!(session.score(), 20);

        session.renderer_mut().detach_mount("page-wrapper");
        assert!(matches!(
            session.reset(Some(20)),
            Err(GameError::MountMissing(_))
        ));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!((session.score(), session.sets_played()), (0, 0));
        assert_eq!(session.pending_timers(), 0);

        // The renderer error surfaces and the failed attempt consumes nothing
        assert!(matches!(session.start(), Err(GameError::MountMissing(_))));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.sets_played(), 0);
        assert_eq!(session.images_remaining(), 10);
        assert!(session.card().is_none());
    }

    fn drag_onto_bottom_right(session: &mut Session<HeadlessRenderer>) {
        let handle = session.card().unwrap().handle;
        let r = session.renderer_mut();
        r.push_pointer(PointerInput {
            target: handle,
            kind: PointerKind::Down,
            client: Vec2::ZERO,
            offset: Vec2::ZERO,
            movement: Vec2::ZERO,
        });
        r.push_pointer(PointerInput {
            target: handle,
            kind: PointerKind::Move,
            client: Vec2::new(620.0, 300.0),
            offset: Vec2::ZERO,
            movement: Vec2::new(1.0, 1.0),
        });
        session.pump_input();
        session.collision_tick();
    }

    #[test]
    fn test_only_primary_target_checked_by_default() {
        let mut session = new_session(config_with(&["thai"]));
        session.start().unwrap();
        drag_onto_bottom_right(&mut session);

        let card = session.card().unwrap();
        assert!(card.entity.as_moving().unwrap().dragging);
        assert_eq!(card.entity.geometry.edges.left, 620.0);
        assert!(session.targets().iter().all(|t| !t.entity.colliding));
        assert_eq!(session.phase(), SessionPhase::InSet);
    }

    #[test]
    fn test_collide_all_targets() {
        let config = GameConfig {
            collide_all_targets: true,
            ..config_with(&["thai"])
        };
        let mut session = new_session(config);
        session.start().unwrap();
        drag_onto_bottom_right(&mut session);

        let bottom_right = &session.targets()[3];
        assert_eq!(bottom_right.entity.corner(), Some(Corner::BottomRight));
        assert!(bottom_right.entity.colliding);
        assert!(bottom_right.entity.sides.top);
        assert!(!session.targets()[0].entity.colliding);
        // Colliding with a target is not an answer
        assert_eq!(session.phase(), SessionPhase::InSet);
    }
}
