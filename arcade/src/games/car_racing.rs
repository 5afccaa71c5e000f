//! Top-down racer: dodge the cars coming down a three-lane road.
use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{LaunchOptions, MiniGame};
use crate::canvas::{rgb, Canvas, Color, TextAlign, BLACK, WHITE};
use crate::display::Screen;
use crate::event::{InputState, Key};
use crate::geometry::Rect;

pub const ID: &str = "car_racing";

const CAR_WIDTH: i32 = 60;
const CAR_HEIGHT: i32 = 100;
const MAX_ROAD_WIDTH: i32 = 400;
const LANES: i32 = 3;

const BASE_SPEED: f32 = 5.0;
const MIN_SPEED: f32 = 1.0;
const MAX_SPEED: f32 = 15.0;
const ACCELERATION: f32 = 0.1;
/// Horizontal speed at the reference width of 1024 px.
const STEER_SPEED: f32 = 8.0;

const OBSTACLE_SPEED: i32 = 5;
const OBSTACLE_START_Y: i32 = -150;
const BASE_SPAWN_INTERVAL_MS: u64 = 1500;
const MIN_SPAWN_INTERVAL_MS: u64 = 500;

const MARKER_WIDTH: i32 = 10;
const MARKER_HEIGHT: i32 = 50;
const MARKER_GAP: i32 = 40;
const HUD_HEIGHT: i32 = 50;

const GRASS: Color = rgb(0, 200, 0);
const ROAD: Color = rgb(100, 100, 100);
const MARKER: Color = rgb(255, 255, 0);
const HUD: Color = rgb(30, 30, 50);
const GAME_OVER: Color = rgb(200, 0, 0);
const WINDSHIELD: Color = rgb(200, 200, 200);

/// (paint, body) colours for the player and the three obstacle kinds.
const PLAYER_PAINT: (Color, Color) = (rgb(0, 0, 255), rgb(0, 0, 150));
const OBSTACLE_PAINTS: [(Color, Color); 3] = [
    (rgb(200, 0, 0), rgb(150, 0, 0)),
    (rgb(0, 200, 0), rgb(0, 150, 0)),
    (rgb(200, 200, 0), rgb(150, 150, 0)),
];

pub fn run(screen: &mut dyn Screen, options: LaunchOptions<'_>) -> Result<u32> {
    let (w, h) = <CarRacing as MiniGame>::WINDOWED;
    let mut game = CarRacing::new(w, h);
    super::play(&mut game, screen, options)
}

/// Milliseconds between obstacle spawns at `score`.
pub fn spawn_interval(score: u32) -> Duration {
    let step = u64::from(score / 5000) * 100;
    Duration::from_millis(BASE_SPAWN_INTERVAL_MS.saturating_sub(step).max(MIN_SPAWN_INTERVAL_MS))
}

#[derive(Debug, Clone, PartialEq)]
struct Obstacle {
    lane: i32,
    x: i32,
    y: i32,
    kind: usize,
}

impl Obstacle {
    fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, CAR_WIDTH, CAR_HEIGHT)
    }
}

/// Everything that depends only on the window size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    width: i32,
    height: i32,
    road_left: i32,
    road_width: i32,
}

impl Layout {
    fn new(width: u32, height: u32) -> Self {
        let width = width as i32;
        let road_width = MAX_ROAD_WIDTH.min((width as f32 * 0.4) as i32);
        Self {
            width,
            height: height as i32,
            road_left: (width - road_width) / 2,
            road_width,
        }
    }

    fn road_right(&self) -> i32 {
        self.road_left + self.road_width
    }

    fn lane_x(&self, lane: i32) -> i32 {
        let lane_width = self.road_width / LANES;
        self.road_left + lane * lane_width + (lane_width - CAR_WIDTH) / 2
    }

    fn player_start(&self) -> (f32, i32) {
        ((self.width / 2 - CAR_WIDTH / 2) as f32, self.height - 150)
    }

    fn lane_markers(&self) -> Vec<f32> {
        (-MARKER_HEIGHT..self.height)
            .step_by((MARKER_HEIGHT + MARKER_GAP) as usize)
            .map(|y| y as f32)
            .collect()
    }
}

pub struct CarRacing {
    layout: Layout,
    player_x: f32,
    player_y: i32,
    speed: f32,
    score: u32,
    high_score: u32,
    game_over: bool,
    road_pos: f32,
    lane_markers: Vec<f32>,
    obstacles: Vec<Obstacle>,
    spawn_interval: Duration,
    since_spawn: Duration,
    rng: StdRng,
}

impl CarRacing {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy())
    }

    fn with_rng(width: u32, height: u32, rng: StdRng) -> Self {
        let layout = Layout::new(width, height);
        let (player_x, player_y) = layout.player_start();
        Self {
            layout,
            player_x,
            player_y,
            speed: BASE_SPEED,
            score: 0,
            high_score: 0,
            game_over: false,
            road_pos: 0.0,
            lane_markers: layout.lane_markers(),
            obstacles: Vec::new(),
            spawn_interval: spawn_interval(0),
            since_spawn: Duration::ZERO,
            rng,
        }
    }

    #[cfg(test)]
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    #[cfg(test)]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn player_rect(&self) -> Rect {
        Rect::new(self.player_x as i32, self.player_y, CAR_WIDTH, CAR_HEIGHT)
    }

    /// Starts a new run. The high score survives.
    pub fn reset(&mut self) {
        self.score = 0;
        self.game_over = false;
        self.speed = BASE_SPEED;
        self.road_pos = 0.0;
        self.obstacles.clear();
        self.spawn_interval = spawn_interval(0);
        self.since_spawn = Duration::ZERO;
        self.relayout(self.layout.width as u32, self.layout.height as u32);
    }

    fn steer(&mut self, input: &InputState) {
        let step = STEER_SPEED * self.layout.width as f32 / 1024.0;
        let min_x = (self.layout.road_left + 10) as f32;
        let max_x = (self.layout.road_right() - CAR_WIDTH - 10) as f32;
        if input.is_held(Key::Left) {
            self.player_x -= step;
            if self.player_x < min_x {
                self.player_x = min_x;
            }
        }
        if input.is_held(Key::Right) {
            self.player_x += step;
            if self.player_x > max_x {
                self.player_x = max_x;
            }
        }

        if input.is_held(Key::Up) {
            self.speed = (self.speed + ACCELERATION).min(MAX_SPEED);
        } else if input.is_held(Key::Down) {
            self.speed = (self.speed - ACCELERATION * 2.0).max(MIN_SPEED);
        } else if (self.speed - BASE_SPEED).abs() <= ACCELERATION / 2.0 {
            self.speed = BASE_SPEED;
        } else if self.speed > BASE_SPEED {
            self.speed -= ACCELERATION / 2.0;
        } else {
            self.speed += ACCELERATION / 2.0;
        }
    }

    fn scroll_markers(&mut self) {
        self.road_pos += self.speed;
        if self.road_pos >= (MARKER_HEIGHT + MARKER_GAP) as f32 {
            self.road_pos = 0.0;
            self.lane_markers.push(-MARKER_HEIGHT as f32);
        }
        for y in &mut self.lane_markers {
            *y += self.speed;
        }
        let height = self.layout.height as f32;
        self.lane_markers.retain(|&y| y < height);
    }

    fn spawn_obstacle(&mut self) {
        let lane = self.rng.gen_range(0..LANES);
        let kind = self.rng.gen_range(0..OBSTACLE_PAINTS.len());
        self.obstacles.push(Obstacle {
            lane,
            x: self.layout.lane_x(lane),
            y: OBSTACLE_START_Y,
            kind,
        });
    }

    fn check_collisions(&mut self) {
        let player = self.player_rect();
        if self.obstacles.iter().any(|o| o.rect().intersects(&player)) {
            self.game_over = true;
            self.high_score = self.high_score.max(self.score);
            debug!(target: "game", "Car racing over at {} (best {})", self.score, self.high_score);
        }
    }

    fn draw_car(canvas: &mut Canvas, x: i32, y: i32, (paint, body): (Color, Color), side_windows: bool) {
        canvas.fill_rect(Rect::new(x, y, CAR_WIDTH, CAR_HEIGHT), paint);
        canvas.fill_rect(Rect::new(x + 5, y + 5, 50, 90), body);
        canvas.fill_rect(Rect::new(x + 10, y + 15, 40, 30), WINDSHIELD);
        canvas.fill_rect(Rect::new(x + 5, y, 50, 10), BLACK);
        canvas.fill_rect(Rect::new(x + 5, y + 90, 50, 10), BLACK);
        if side_windows {
            canvas.fill_rect(Rect::new(x + 5, y + 25, 10, 20), BLACK);
            canvas.fill_rect(Rect::new(x + 45, y + 25, 10, 20), BLACK);
        }
    }
}

impl MiniGame for CarRacing {
    const TITLE: &'static str = "Car Racing";
    const WINDOWED: (u32, u32) = (1024, 768);

    fn relayout(&mut self, width: u32, height: u32) {
        let layout = Layout::new(width, height);
        let (player_x, player_y) = layout.player_start();
        self.player_x = player_x;
        self.player_y = player_y;
        self.lane_markers = layout.lane_markers();
        for obstacle in &mut self.obstacles {
            obstacle.x = layout.lane_x(obstacle.lane);
        }
        self.layout = layout;
    }

    fn key_down(&mut self, key: Key) {
        if key == Key::R && self.game_over {
            self.reset();
        }
    }

    fn update(&mut self, input: &InputState, dt: Duration) {
        if self.game_over {
            return;
        }
        self.steer(input);
        self.score += self.speed.floor() as u32;
        self.scroll_markers();

        self.since_spawn += dt;
        if self.since_spawn > self.spawn_interval {
            self.spawn_obstacle();
            self.since_spawn = Duration::ZERO;
            self.spawn_interval = spawn_interval(self.score);
        }

        let height = self.layout.height;
        for obstacle in &mut self.obstacles {
            obstacle.y += OBSTACLE_SPEED;
        }
        self.obstacles.retain(|o| o.y <= height);

        self.check_collisions();
    }

    fn draw(&mut self, canvas: &mut Canvas) {
        let Layout { width, height, road_left, road_width } = self.layout;
        canvas.fill(GRASS);
        canvas.fill_rect(Rect::new(road_left, 0, road_width, height), ROAD);
        for &y in &self.lane_markers {
            canvas.fill_rect(
                Rect::new(width / 2 - MARKER_WIDTH / 2, y as i32, MARKER_WIDTH, MARKER_HEIGHT),
                MARKER,
            );
        }
        for o in &self.obstacles {
            Self::draw_car(canvas, o.x, o.y, OBSTACLE_PAINTS[o.kind], false);
        }
        let player = self.player_rect();
        Self::draw_car(canvas, player.x, player.y, PLAYER_PAINT, true);

        canvas.fill_rect(Rect::new(0, 0, width, HUD_HEIGHT), HUD);
        canvas.line((0, HUD_HEIGHT), (width, HUD_HEIGHT), WHITE, 2);
        canvas.draw_text(&format!("Score: {}", self.score), 24, WHITE, 20, 25, TextAlign::Left);
        canvas.draw_text(
            &format!("Speed: {} km/h", (self.speed * 10.0) as i32),
            24,
            WHITE,
            width / 2,
            25,
            TextAlign::Center,
        );
        canvas.draw_text(
            &format!("High Score: {}", self.high_score),
            24,
            WHITE,
            width - 20,
            25,
            TextAlign::Right,
        );

        if self.game_over {
            canvas.shade(Rect::new(0, 0, width, height), BLACK, 180);
            let cx = width / 2;
            canvas.draw_text("GAME OVER", 64, GAME_OVER, cx, height / 2 - 50, TextAlign::Center);
            canvas.draw_text(
                &format!("Final Score: {}", self.score),
                32,
                WHITE,
                cx,
                height / 2 + 20,
                TextAlign::Center,
            );
            canvas.draw_text(
                "Press R to Restart or ESC to Exit",
                24,
                WHITE,
                cx,
                height / 2 + 70,
                TextAlign::Center,
            );
        }
    }

    fn score(&self) -> u32 {
        self.score
    }
}
