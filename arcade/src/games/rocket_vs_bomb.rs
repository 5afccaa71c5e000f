//! Steer a rocket through falling bombs. Every bomb that makes it past the
//! rocket scores; every hit costs a life.
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

pub const ID: &str = "rocket_vs_bomb";

const ROCKET_WIDTH: i32 = 50;
const ROCKET_HEIGHT: i32 = 80;
const ROCKET_INSET: i32 = 10;
const ROCKET_SPEED: f32 = 6.0;
/// Distance from the rocket's top edge to the bottom of the window.
const ROCKET_BOTTOM_OFFSET: f32 = 100.0;

const BOMB_WIDTH: i32 = 40;
const BOMB_HEIGHT: i32 = 50;
const BOMB_INSET: i32 = 5;
const BOMB_START_Y: f32 = -50.0;
const BOMB_POINTS: u32 = 10;

const BASE_SPAWN_DELAY: u32 = 80;
const MIN_SPAWN_DELAY: u32 = 30;
const POINTS_PER_LEVEL: u32 = 200;
pub const DEFAULT_LIVES: u32 = 3;

const STAR_COUNT: usize = 100;
const EXPLOSION_LIFETIME: i32 = 30;
const EXPLOSION_PARTICLES: usize = 15;
const EXPLOSION_MAX_RADIUS: i32 = 60;
const GRAVITY: f32 = 0.3;
const HUD_HEIGHT: i32 = 60;

const SILVER: Color = rgb(192, 192, 192);
const GRAY: Color = rgb(128, 128, 128);
const LIGHT_GRAY: Color = rgb(211, 211, 211);
const DARK_BLUE: Color = rgb(25, 25, 112);
const LIGHT_BLUE: Color = rgb(135, 206, 235);
const GOLD: Color = rgb(255, 215, 0);
const ORANGE: Color = rgb(255, 165, 0);
const YELLOW: Color = rgb(255, 255, 0);
const RED: Color = rgb(220, 20, 60);
const DARK_RED: Color = rgb(139, 0, 0);
const FUSE: Color = rgb(139, 69, 19);
const SHADOW: Color = rgb(50, 50, 50);
const FIRE: [Color; 3] = [RED, ORANGE, YELLOW];

pub fn run(screen: &mut dyn Screen, options: LaunchOptions<'_>) -> Result<u32> {
    let (w, h) = <RocketVsBomb as MiniGame>::WINDOWED;
    let mut game = RocketVsBomb::new(w, h);
    super::play(&mut game, screen, options)
}

/// Frames between bomb spawns at `level`.
pub fn spawn_delay(level: u32) -> u32 {
    BASE_SPAWN_DELAY
        .saturating_sub(level.saturating_sub(1) * 5)
        .max(MIN_SPAWN_DELAY)
}

/// Pixels per frame a bomb falls at `level`.
pub fn bomb_speed(level: u32) -> f32 {
    3.0 + level.saturating_sub(1) as f32 * 0.5
}

#[derive(Debug, Clone, PartialEq)]
struct Rocket {
    x: f32,
    y: f32,
    flame: u32,
}

impl Rocket {
    fn hitbox(&self) -> Rect {
        Rect::new(self.x as i32, self.y as i32, ROCKET_WIDTH, ROCKET_HEIGHT)
            .inset(ROCKET_INSET, ROCKET_INSET)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Bomb {
    x: f32,
    y: f32,
    /// Degrees; only wiggles the fuse.
    rotation: u32,
    spark: u32,
}

impl Bomb {
    fn fall(&mut self, speed: f32) {
        self.y += speed;
        self.rotation = (self.rotation + 2) % 360;
        self.spark = (self.spark + 1) % 20;
    }

    fn hitbox(&self) -> Rect {
        Rect::new(self.x as i32, self.y as i32, BOMB_WIDTH, BOMB_HEIGHT).inset(BOMB_INSET, BOMB_INSET)
    }

    fn center(&self) -> (f32, f32) {
        (self.x + (BOMB_WIDTH / 2) as f32, self.y + (BOMB_HEIGHT / 2) as f32)
    }
}

#[derive(Debug, Clone)]
struct Particle {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    size: f32,
    color: Color,
}

#[derive(Debug, Clone)]
struct Explosion {
    x: f32,
    y: f32,
    radius: i32,
    lifetime: i32,
    particles: Vec<Particle>,
}

impl Explosion {
    fn new(x: f32, y: f32, rng: &mut StdRng) -> Self {
        let particles = (0..EXPLOSION_PARTICLES)
            .map(|_| Particle {
                x: x + rng.gen_range(-10..=10) as f32,
                y: y + rng.gen_range(-10..=10) as f32,
                vx: rng.gen_range(-8..=8) as f32,
                vy: rng.gen_range(-8..=8) as f32,
                size: rng.gen_range(3..=8) as f32,
                color: FIRE[rng.gen_range(0..FIRE.len())],
            })
            .collect();
        Self {
            x,
            y,
            radius: 5,
            lifetime: EXPLOSION_LIFETIME,
            particles,
        }
    }

    fn update(&mut self) {
        self.radius = (self.radius + 3).min(EXPLOSION_MAX_RADIUS);
        self.lifetime -= 1;
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.vy += GRAVITY;
            p.size = (p.size - 0.2).max(1.0);
        }
    }

    fn is_finished(&self) -> bool {
        self.lifetime <= 0
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Star {
    x: f32,
    y: f32,
    speed: f32,
    brightness: u8,
}

pub struct RocketVsBomb {
    width: i32,
    height: i32,
    rocket: Rocket,
    bombs: Vec<Bomb>,
    explosions: Vec<Explosion>,
    stars: Vec<Star>,
    spawn_timer: u32,
    score: u32,
    lives: u32,
    max_lives: u32,
    level: u32,
    game_over: bool,
    paused: bool,
    rng: StdRng,
}

impl RocketVsBomb {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy())
    }

    fn with_rng(width: u32, height: u32, mut rng: StdRng) -> Self {
        let (w, h) = (width as i32, height as i32);
        let stars = (0..STAR_COUNT)
            .map(|_| Star {
                x: rng.gen_range(0..=w.max(0)) as f32,
                y: rng.gen_range(0..=h.max(0)) as f32,
                speed: rng.gen_range(0.5..2.0),
                brightness: rng.gen_range(100..=255),
            })
            .collect();
        Self {
            width: w,
            height: h,
            rocket: Self::rocket_start(w, h),
            bombs: Vec::new(),
            explosions: Vec::new(),
            stars,
            spawn_timer: 0,
            score: 0,
            lives: DEFAULT_LIVES,
            max_lives: DEFAULT_LIVES,
            level: 1,
            game_over: false,
            paused: false,
            rng,
        }
    }

    /// Number of lives each run starts with (at least one).
    #[cfg(test)]
    fn with_lives(mut self, lives: u32) -> Self {
        self.max_lives = lives.max(1);
        self.lives = self.max_lives;
        self
    }

    #[cfg(test)]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    #[cfg(test)]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[cfg(test)]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[cfg(test)]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn rocket_start(width: i32, height: i32) -> Rocket {
        Rocket {
            x: (width / 2 - ROCKET_WIDTH / 2) as f32,
            y: height as f32 - ROCKET_BOTTOM_OFFSET,
            flame: 0,
        }
    }

    fn max_rocket_x(&self) -> f32 {
        ((self.width - ROCKET_WIDTH) as f32).max(0.0)
    }

    pub fn restart(&mut self) {
        self.rocket = Self::rocket_start(self.width, self.height);
        self.bombs.clear();
        self.explosions.clear();
        self.spawn_timer = 0;
        self.score = 0;
        self.lives = self.max_lives;
        self.level = 1;
        self.game_over = false;
        self.paused = false;
    }

    fn steer(&mut self, input: &InputState) {
        if input.any_held(&[Key::Left, Key::A]) {
            self.rocket.x = (self.rocket.x - ROCKET_SPEED).max(0.0);
        }
        if input.any_held(&[Key::Right, Key::D]) {
            self.rocket.x = (self.rocket.x + ROCKET_SPEED).min(self.max_rocket_x());
        }
    }

    fn spawn_bomb(&mut self) {
        let x = self.rng.gen_range(0..=(self.width - BOMB_WIDTH).max(0));
        self.bombs.push(Bomb {
            x: x as f32,
            y: BOMB_START_Y,
            rotation: 0,
            spark: 0,
        });
    }

    fn drift_stars(&mut self) {
        let (w, h) = (self.width.max(0), self.height as f32);
        for star in &mut self.stars {
            star.y += star.speed;
            if star.y > h {
                star.y = 0.0;
                star.x = self.rng.gen_range(0..=w) as f32;
            }
        }
    }

    /// Moves every bomb, scoring those that left the screen and exploding
    /// those that reached the rocket.
    fn advance_bombs(&mut self) {
        let speed = bomb_speed(self.level);
        let bottom = self.height as f32;
        let rocket = self.rocket.hitbox();
        let mut passed = 0;
        let mut hits = Vec::new();
        self.bombs.retain_mut(|bomb| {
            bomb.fall(speed);
            if bomb.y > bottom {
                passed += 1;
                false
            } else if bomb.hitbox().intersects(&rocket) {
                hits.push(bomb.center());
                false
            } else {
                true
            }
        });

        self.score += passed * BOMB_POINTS;
        for (x, y) in hits {
            self.explosions.push(Explosion::new(x, y, &mut self.rng));
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 && !self.game_over {
                self.game_over = true;
                debug!(target: "game", "Rocket vs bomb over at {} (level {})", self.score, self.level);
            }
        }
    }

    fn draw_background(&self, canvas: &mut Canvas) {
        let h = self.height.max(1);
        for y in 0..h {
            let t = y as f32 / h as f32;
            let color = rgb(
                (25.0 * (1.0 - t)) as u8,
                (25.0 * (1.0 - t)) as u8,
                (112.0 * (1.0 - t) + 25.0 * t) as u8,
            );
            canvas.fill_rect(Rect::new(0, y, self.width, 1), color);
        }
        for star in &self.stars {
            let b = star.brightness;
            canvas.fill_rect(Rect::new(star.x as i32, star.y as i32, 2, 2), rgb(b, b, b));
        }
    }

    fn draw_rocket(&mut self, canvas: &mut Canvas) {
        let r = &mut self.rocket;
        r.flame = (r.flame + 1) % 10;
        let (x, y) = (r.x as i32, r.y as i32);
        let (w, h) = (ROCKET_WIDTH, ROCKET_HEIGHT);
        let cx = x + w / 2;
        let flame = 15 + (r.flame / 2) as i32;

        canvas.fill_polygon(&[(cx - 8, y + h), (cx, y + h + flame), (cx + 8, y + h)], ORANGE);
        canvas.fill_polygon(&[(cx - 4, y + h), (cx, y + h + flame - 5), (cx + 4, y + h)], YELLOW);

        let body = Rect::new(x + 8, y + 20, w - 16, h - 30);
        canvas.fill_rect(body, SILVER);
        canvas.stroke_rect(body, GRAY, 2);

        let nose = [(cx, y), (x + 8, y + 20), (x + w - 8, y + 20)];
        canvas.fill_polygon(&nose, LIGHT_GRAY);
        canvas.stroke_polygon(&nose, GRAY);

        let left_fin = [(x + 8, y + 50), (x, y + 70), (x + 8, y + 70)];
        let right_fin = [(x + w - 8, y + 50), (x + w, y + 70), (x + w - 8, y + 70)];
        for fin in [left_fin, right_fin] {
            canvas.fill_polygon(&fin, DARK_BLUE);
            canvas.stroke_polygon(&fin, BLACK);
        }

        canvas.fill_circle((cx, y + 30), 6, LIGHT_BLUE);
        canvas.stroke_circle((cx, y + 30), 6, DARK_BLUE, 2);
        for i in 0..3 {
            let sy = y + 40 + i * 8;
            canvas.line((x + 10, sy), (x + w - 10, sy), DARK_BLUE, 2);
        }
    }

    fn draw_bomb(bomb: &Bomb, canvas: &mut Canvas) {
        let (x, y) = (bomb.x as i32, bomb.y as i32);
        let (w, h) = (BOMB_WIDTH, BOMB_HEIGHT);
        let cx = x + w / 2;

        canvas.fill_ellipse(Rect::new(x + 3, y + 3, w, h - 10), SHADOW);
        let body = Rect::new(x, y + 10, w, h - 10);
        canvas.fill_ellipse(body, BLACK);
        canvas.stroke_ellipse(body, DARK_RED, 3);
        canvas.fill_ellipse(Rect::new(x + 8, y + 15, w - 20, h - 25), GRAY);

        let wobble = ((bomb.rotation as f32).to_radians().cos() * 3.0) as i32;
        let tip = (cx + wobble, y + 5 - 15);
        canvas.line((cx, y + 10), tip, FUSE, 4);
        if bomb.spark < 10 {
            let color = FIRE[(bomb.spark % 3) as usize];
            canvas.fill_circle(tip, 3, color);
        }
        canvas.draw_text("BOMB", 8, WHITE, cx, y + h / 2 + 5, TextAlign::Center);
    }

    fn draw_explosion(explosion: &Explosion, canvas: &mut Canvas) {
        if explosion.is_finished() {
            return;
        }
        let r = explosion.radius;
        let bounds = Rect::new(explosion.x as i32 - r, explosion.y as i32 - r, r * 2, r * 2);
        let alpha = (explosion.lifetime * 8).clamp(0, 255) as u8;
        // Square approximation of the translucent fireball, then the solid core.
        canvas.shade(bounds.inset(r / 3, r / 3), ORANGE, alpha);
        canvas.fill_circle((explosion.x as i32, explosion.y as i32), r / 3, ORANGE);
        for p in &explosion.particles {
            if p.size > 1.0 {
                canvas.fill_circle((p.x as i32, p.y as i32), p.size as i32, p.color);
            }
        }
    }

    fn draw_hud(&self, canvas: &mut Canvas) {
        canvas.shade(Rect::new(0, 0, self.width, HUD_HEIGHT), BLACK, 180);
        canvas.draw_text(&format!("SCORE: {:06}", self.score), 16, GOLD, 20, 30, TextAlign::Left);
        canvas.draw_text("LIVES:", 16, WHITE, 200, 30, TextAlign::Left);
        for i in 0..self.lives as i32 {
            let hx = 280 + i * 25;
            canvas.fill_polygon(
                &[
                    (hx, 36),
                    (hx - 8, 26),
                    (hx - 8, 21),
                    (hx - 4, 17),
                    (hx, 21),
                    (hx + 4, 17),
                    (hx + 8, 21),
                    (hx + 8, 26),
                ],
                RED,
            );
        }
        canvas.draw_text(&format!("LEVEL: {}", self.level), 16, LIGHT_BLUE, 400, 30, TextAlign::Left);
        if self.score < 50 {
            canvas.draw_text(
                "<- -> or A/D to move | ESC to quit | P to pause",
                16,
                LIGHT_GRAY,
                20,
                self.height - 20,
                TextAlign::Left,
            );
        }
    }

    fn draw_paused(&self, canvas: &mut Canvas) {
        let (cx, cy) = (self.width / 2, self.height / 2);
        canvas.shade(Rect::new(0, 0, self.width, self.height), BLACK, 128);
        canvas.draw_text("PAUSED", 64, WHITE, cx, cy, TextAlign::Center);
        canvas.draw_text("Press P to resume", 24, LIGHT_GRAY, cx, cy + 50, TextAlign::Center);
    }

    fn draw_game_over(&self, canvas: &mut Canvas) {
        let (cx, cy) = (self.width / 2, self.height / 2);
        canvas.shade(Rect::new(0, 0, self.width, self.height), BLACK, 200);
        for (dx, dy) in [(2, 2), (-2, -2), (2, -2), (-2, 2)] {
            canvas.draw_text("GAME OVER", 64, DARK_RED, cx + dx, cy - 50 + dy, TextAlign::Center);
        }
        canvas.draw_text("GAME OVER", 64, RED, cx, cy - 50, TextAlign::Center);
        canvas.draw_text(
            &format!("Final Score: {:06}", self.score),
            32,
            GOLD,
            cx,
            cy + 20,
            TextAlign::Center,
        );
        canvas.draw_text(
            &format!("Level Reached: {}", self.level),
            24,
            LIGHT_BLUE,
            cx,
            cy + 60,
            TextAlign::Center,
        );
        canvas.draw_text(
            "Press R to Restart or ESC to Quit",
            24,
            WHITE,
            cx,
            cy + 100,
            TextAlign::Center,
        );
    }
}

impl MiniGame for RocketVsBomb {
    const TITLE: &'static str = "Rocket vs Bomb";
    const WINDOWED: (u32, u32) = (800, 600);

    /// Scales every position by the size ratio; the rocket stays at the
    /// bottom edge.
    fn relayout(&mut self, width: u32, height: u32) {
        let (w, h) = (width as i32, height as i32);
        if (w, h) == (self.width, self.height) {
            return;
        }
        let sx = w as f32 / self.width.max(1) as f32;
        let sy = h as f32 / self.height.max(1) as f32;
        self.width = w;
        self.height = h;

        self.rocket.x = (self.rocket.x * sx).clamp(0.0, self.max_rocket_x());
        self.rocket.y = h as f32 - ROCKET_BOTTOM_OFFSET;
        for bomb in &mut self.bombs {
            bomb.x *= sx;
            bomb.y *= sy;
        }
        for star in &mut self.stars {
            star.x *= sx;
            star.y *= sy;
        }
        for explosion in &mut self.explosions {
            explosion.x *= sx;
            explosion.y *= sy;
        }
    }

    fn key_down(&mut self, key: Key) {
        match key {
            Key::P if !self.game_over => self.paused = !self.paused,
            Key::R if self.game_over => self.restart(),
            _ => {}
        }
    }

    fn update(&mut self, input: &InputState, _dt: Duration) {
        self.drift_stars();
        if self.game_over || self.paused {
            return;
        }
        self.steer(input);
        self.level = self.score / POINTS_PER_LEVEL + 1;

        self.spawn_timer += 1;
        if self.spawn_timer >= spawn_delay(self.level) {
            self.spawn_bomb();
            self.spawn_timer = 0;
        }
        self.advance_bombs();

        for explosion in &mut self.explosions {
            explosion.update();
        }
        self.explosions.retain(|e| !e.is_finished());
    }

    fn draw(&mut self, canvas: &mut Canvas) {
        self.draw_background(canvas);
        if self.paused {
            self.draw_paused(canvas);
        } else if self.game_over {
            self.draw_game_over(canvas);
        } else {
            self.draw_rocket(canvas);
            for bomb in &self.bombs {
                Self::draw_bomb(bomb, canvas);
            }
            for explosion in &self.explosions {
                Self::draw_explosion(explosion, canvas);
            }
            self.draw_hud(canvas);
        }
    }

    fn score(&self) -> u32 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::headless::HeadlessScreen;
    use crate::event::InputEvent;

    const FRAME: Duration = Duration::from_millis(16);

    fn game() -> RocketVsBomb {
        RocketVsBomb::with_rng(800, 600, StdRng::seed_from_u64(11))
    }

    fn holding(keys: &[Key]) -> InputState {
        let mut input = InputState::default();
        for &key in keys {
            input.apply(&InputEvent::KeyDown(key));
        }
        input
    }

    fn bomb_at(x: f32, y: f32) -> Bomb {
        Bomb { x, y, rotation: 0, spark: 0 }
    }

    fn idle(g: &mut RocketVsBomb, frames: usize) {
        let none = InputState::default();
        for _ in 0..frames {
            g.update(&none, FRAME);
        }
    }

    // ── difficulty ────────────────────────────────────────────────────────────

    #[test]
    fn spawn_delay_shrinks_per_level() {
        assert_eq!(spawn_delay(1), 80);
        assert_eq!(spawn_delay(3), 70);
        assert_eq!(spawn_delay(11), 30);
        assert_eq!(spawn_delay(40), 30);
    }

    #[test]
    fn bomb_speed_grows_per_level() {
        assert_eq!(bomb_speed(1), 3.0);
        assert_eq!(bomb_speed(3), 4.0);
    }

    #[test]
    fn level_follows_score() {
        let mut g = game();
        g.score = 450;
        idle(&mut g, 1);
        assert_eq!(g.level(), 3);
    }

    // ── layout and controls ───────────────────────────────────────────────────

    #[test]
    fn rocket_starts_bottom_centre() {
        let g = game();
        assert_eq!((g.rocket.x, g.rocket.y), (375.0, 500.0));
        assert_eq!(g.rocket.hitbox(), Rect::new(385, 510, 30, 60));
        assert_eq!(g.stars.len(), STAR_COUNT);
    }

    #[test]
    fn steering_is_clamped_to_window() {
        let mut g = game();
        let left = holding(&[Key::A]);
        for _ in 0..100 {
            g.steer(&left);
        }
        assert_eq!(g.rocket.x, 0.0);

        let right = holding(&[Key::Right]);
        for _ in 0..200 {
            g.steer(&right);
        }
        assert_eq!(g.rocket.x, 750.0);
    }

    #[test]
    fn relayout_same_size_changes_nothing() {
        let mut g = game();
        g.bombs.push(bomb_at(120.0, 40.0));
        let before = (g.rocket.clone(), g.bombs.clone(), g.stars.clone());
        g.relayout(800, 600);
        assert_eq!((g.rocket.clone(), g.bombs.clone(), g.stars.clone()), before);
    }

    #[test]
    fn relayout_scales_proportionally_and_back() {
        let mut g = game();
        g.bombs.push(bomb_at(200.0, 150.0));
        g.relayout(1600, 1200);
        assert_eq!((g.rocket.x, g.rocket.y), (750.0, 1100.0));
        assert_eq!((g.bombs[0].x, g.bombs[0].y), (400.0, 300.0));

        g.relayout(1600, 1200);
        assert_eq!(g.rocket.x, 750.0);

        g.relayout(800, 600);
        assert_eq!((g.rocket.x, g.rocket.y), (375.0, 500.0));
        assert_eq!((g.bombs[0].x, g.bombs[0].y), (200.0, 150.0));
    }

    // ── bombs ─────────────────────────────────────────────────────────────────

    #[test]
    fn bombs_spawn_after_delay() {
        let mut g = game();
        idle(&mut g, 79);
        assert!(g.bombs.is_empty());
        idle(&mut g, 1);
        assert_eq!(g.bombs.len(), 1);
        assert_eq!(g.bombs[0].y, BOMB_START_Y + 3.0);
        assert!(g.bombs[0].x >= 0.0 && g.bombs[0].x <= 760.0);
    }

    #[test]
    fn bomb_past_bottom_scores() {
        let mut g = game();
        g.bombs.push(bomb_at(0.0, 599.0));
        idle(&mut g, 1);
        assert!(g.bombs.is_empty());
        assert_eq!(g.score(), 10);
        assert_eq!(g.lives(), DEFAULT_LIVES);
    }

    #[test]
    fn hit_costs_a_life_and_explodes() {
        let mut g = game();
        g.bombs.push(bomb_at(380.0, 470.0));
        idle(&mut g, 1);
        assert!(g.bombs.is_empty());
        assert_eq!(g.lives(), DEFAULT_LIVES - 1);
        assert_eq!(g.explosions.len(), 1);
        assert_eq!(g.explosions[0].particles.len(), EXPLOSION_PARTICLES);
        assert!(!g.is_game_over());
    }

    #[test]
    fn sprite_overlap_outside_hitboxes_is_harmless() {
        let mut g = game();
        // Bomb hitbox spans x 5..35 of the bomb; rocket hitbox starts at 385.
        g.bombs.push(bomb_at(350.0, 500.0));
        idle(&mut g, 1);
        assert_eq!(g.bombs.len(), 1);
        assert_eq!(g.lives(), DEFAULT_LIVES);
    }

    #[test]
    fn last_life_ends_the_game() {
        let mut g = game().with_lives(1);
        g.bombs.push(bomb_at(380.0, 470.0));
        idle(&mut g, 1);
        assert!(g.is_game_over());
        assert_eq!(g.lives(), 0);
    }

    #[test]
    fn explosions_expire() {
        let mut g = game();
        g.explosions.push(Explosion::new(100.0, 100.0, &mut StdRng::seed_from_u64(3)));
        idle(&mut g, 29);
        assert_eq!(g.explosions.len(), 1);
        idle(&mut g, 1);
        assert!(g.explosions.is_empty());
    }

    // ── pause and restart ─────────────────────────────────────────────────────

    #[test]
    fn pause_freezes_bombs() {
        let mut g = game();
        g.bombs.push(bomb_at(10.0, 100.0));
        g.key_down(Key::P);
        assert!(g.is_paused());
        idle(&mut g, 10);
        assert_eq!(g.bombs[0].y, 100.0);
        g.key_down(Key::P);
        idle(&mut g, 1);
        assert_eq!(g.bombs[0].y, 103.0);
    }

    #[test]
    fn restart_only_after_game_over() {
        let mut g = game().with_lives(2);
        g.score = 120;
        g.key_down(Key::R);
        assert_eq!(g.score(), 120);

        g.game_over = true;
        g.lives = 0;
        g.bombs.push(bomb_at(1.0, 1.0));
        g.key_down(Key::P);
        assert!(!g.is_paused());

        g.key_down(Key::R);
        assert!(!g.is_game_over());
        assert_eq!(g.score(), 0);
        assert_eq!(g.lives(), 2);
        assert_eq!(g.level(), 1);
        assert!(g.bombs.is_empty());
        assert_eq!(g.spawn_timer, 0);
    }

    // ── loop ──────────────────────────────────────────────────────────────────

    #[test]
    fn run_draws_at_windowed_size() {
        let mut screen = HeadlessScreen::new(10, 10);
        screen.idle_frames(3);
        let options = LaunchOptions { fps: 1000, ..LaunchOptions::default() };
        assert_eq!(run(&mut screen, options).unwrap(), 0);
        assert_eq!(screen.presented, 3);
        assert_eq!(screen.last_frame.unwrap().dimensions(), (800, 600));
    }
}
