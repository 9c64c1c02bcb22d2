// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sprite test
//!
//! Moves N sprites around the window, bouncing off the edges of the safe
//! area. Each frame also draws reference points, lines and corner rects so
//! that a broken viewport shows up immediately.

use super::Options;
use crate::core::action::{Action, ActionHandle};
use crate::core::error::Result;
use crate::core::event::Event;
use crate::core::geometry::{Color, FPoint, FRect, Rect, Vertex};
use crate::core::renderer::{RenderFlags, Renderer};
use crate::core::surface::Surface;
use crate::core::texture::{BlendMode, Texture};
use crate::core::window::Window;
use crate::frontend::app::{AppContext, Game, WindowProperties};
use clap::Args;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

const BACKGROUND: Color = Color::rgba(0xA0, 0xA0, 0xA0, 0x00);

/// Seconds between frame rate reports
pub const FPS_REPORT_PERIOD: f64 = 5.0;

/// Arguments of the `sprite` subcommand
#[derive(Args, Debug, Clone)]
pub struct SpriteArgs {
    /// Blend mode used for drawing operations
    #[arg(long = "blend", default_value = "blend", value_parser = parse_blend)]
    pub blend_mode: BlendMode,

    /// Changes the images color every frame
    #[arg(long)]
    pub cycle_color: bool,

    /// Changes the transparency color every frame
    #[arg(long)]
    pub cycle_alpha: bool,

    /// Pause the program when the window is occluded
    #[arg(short, long)]
    pub suspend_when_occluded: bool,

    /// Rendering mode to use (default, mode1, mode2)
    #[arg(short, long, default_value = "default", value_parser = parse_render_mode)]
    pub render_mode: RenderMode,

    /// Number of iterations to run (negative runs forever)
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub iterations: i64,

    /// Seed for sprite placement
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of sprites
    #[arg(default_value_t = 100)]
    pub count: usize,

    /// Image to use for the sprites
    #[arg(default_value = "icon.bmp")]
    pub image: String,
}

fn parse_blend(s: &str) -> std::result::Result<BlendMode, String> {
    Ok(BlendMode::parse(s))
}

fn parse_render_mode(s: &str) -> std::result::Result<RenderMode, String> {
    Ok(RenderMode::parse(s))
}

/// How sprites are submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Texture copies
    #[default]
    Default,
    /// Two textured triangles per sprite
    Mode1,
    /// Four indexed textured triangles per sprite
    Mode2,
}

impl RenderMode {
    /// Unknown names select [`RenderMode::Default`]
    pub fn parse(name: &str) -> RenderMode {
        match name {
            "mode1" => RenderMode::Mode1,
            "mode2" => RenderMode::Mode2,
            _ => RenderMode::Default,
        }
    }
}

/// Remaining sprite-move iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iterations {
    None,
    Forever,
    Count(u64),
}

impl Iterations {
    /// Negative values run forever, 0 never moves
    pub fn from_raw(raw: i64) -> Iterations {
        match raw {
            ..=-1 => Iterations::Forever,
            0 => Iterations::None,
            n => Iterations::Count(n as u64),
        }
    }

    pub fn allows_motion(self) -> bool {
        self != Iterations::None
    }

    /// Count one iteration down; the last one turns into `None`
    pub fn decrement(&mut self) {
        if let Iterations::Count(n) = *self {
            *self = if n > 1 {
                Iterations::Count(n - 1)
            } else {
                Iterations::None
            };
        }
    }
}

/// A value bouncing between 0 and 255 by one step per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    value: i32,
    direction: i32,
}

impl Default for Cycle {
    fn default() -> Self {
        Self {
            value: 0,
            direction: 1,
        }
    }
}

impl Cycle {
    pub fn step(&mut self) -> u8 {
        self.value += self.direction;
        if self.value < 0 {
            self.value = 0;
            self.direction = -self.direction;
        }
        if self.value > 255 {
            self.value = 255;
            self.direction = -self.direction;
        }
        self.value as u8
    }
}

/// Frame counter reporting the frame rate from a repeating timed action
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    frames: Rc<Cell<u64>>,
    last_fps: Rc<Cell<Option<f64>>>,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the report action, every `period` seconds
    pub fn start(&self, ctx: &mut AppContext, period: f64) -> ActionHandle {
        let frames = self.frames.clone();
        let last_fps = self.last_fps.clone();
        let sdl = ctx.sdl().clone();
        let mut since = sdl.ticks();

        ctx.schedule(Action::repeating(period, move |_| {
            let now = sdl.ticks();
            let elapsed = now.saturating_sub(since);
            if elapsed > 0 {
                let fps = frames.get() as f64 * 1000.0 / elapsed as f64;
                println!("{:.2} frames per second", fps);
                last_fps.set(Some(fps));
            }
            frames.set(0);
            since = now;
        }))
    }

    pub fn increment(&self) {
        self.frames.set(self.frames.get() + 1);
    }

    /// Last reported frame rate
    pub fn last_fps(&self) -> Option<f64> {
        self.last_fps.get()
    }
}

/// Advance a sprite, bouncing off the viewport edges
pub fn move_sprite(position: &mut FPoint, velocity: &mut FPoint, size: (f32, f32), viewport: (f32, f32)) {
    position.x += velocity.x;
    if position.x < 0.0 || position.x >= viewport.0 - size.0 {
        velocity.x = -velocity.x;
        position.x += velocity.x;
    }

    position.y += velocity.y;
    if position.y < 0.0 || position.y >= viewport.1 - size.1 {
        velocity.y = -velocity.y;
        position.y += velocity.y;
    }
}

/// Textured quad as two triangles (six vertices)
fn quad_triangles(rect: FRect) -> [Vertex; 6] {
    let [tl, tr, br, bl] = quad_corners(rect);
    [tl, tr, br, tl, br, bl]
}

fn quad_corners(rect: FRect) -> [Vertex; 4] {
    let (x0, y0, x1, y1) = (rect.x, rect.y, rect.x + rect.w, rect.y + rect.h);
    [
        Vertex::new(FPoint::new(x0, y0), FPoint::new(0.0, 0.0)),
        Vertex::new(FPoint::new(x1, y0), FPoint::new(1.0, 0.0)),
        Vertex::new(FPoint::new(x1, y1), FPoint::new(1.0, 1.0)),
        Vertex::new(FPoint::new(x0, y1), FPoint::new(0.0, 1.0)),
    ]
}

/// Textured quad as four triangles around its center
fn quad_fan(rect: FRect) -> ([Vertex; 5], [i32; 12]) {
    let [tl, tr, br, bl] = quad_corners(rect);
    let center = Vertex::new(
        FPoint::new(rect.x + rect.w / 2.0, rect.y + rect.h / 2.0),
        FPoint::new(0.5, 0.5),
    );
    (
        [center, tl, tr, br, bl],
        [0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 1],
    )
}

/// The sprite test
pub struct Sprite {
    args: SpriteArgs,
    image: PathBuf,
    renderer: Option<Renderer>,
    sprite: Option<Texture>,
    sprite_size: (f32, f32),
    positions: Vec<FPoint>,
    velocities: Vec<FPoint>,
    iterations: Iterations,
    color: Cycle,
    alpha: Cycle,
    suspended: bool,
    frame_counter: FrameCounter,
    rng: StdRng,
}

impl Sprite {
    pub fn new(args: SpriteArgs, options: &Options) -> Self {
        let rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            image: options.asset(&args.image),
            iterations: Iterations::from_raw(args.iterations),
            args,
            renderer: None,
            sprite: None,
            sprite_size: (0.0, 0.0),
            positions: Vec::new(),
            velocities: Vec::new(),
            color: Cycle::default(),
            alpha: Cycle::default(),
            suspended: false,
            frame_counter: FrameCounter::new(),
            rng,
        }
    }

    pub fn positions(&self) -> &[FPoint] {
        &self.positions
    }

    pub fn frame_counter(&self) -> &FrameCounter {
        &self.frame_counter
    }

    /// Load the sprite image with its top-left pixel as transparent color
    fn load_sprite(&self, renderer: &Renderer) -> Result<Texture> {
        let surface = Surface::load_bmp(renderer.sdl(), &self.image)?;
        let key = surface.pixel(0, 0)?;
        surface.set_color_key(Some(key))?;
        let texture = renderer.texture_from_surface(&surface)?;
        texture.set_blend_mode(self.args.blend_mode)?;
        Ok(texture)
    }

    fn draw_test_points(renderer: &Renderer, viewport: Rect) -> Result<()> {
        let (w, h) = (viewport.w as f32, viewport.h as f32);
        renderer.points(
            &[
                FPoint::new(0.0, 0.0),
                FPoint::new(w - 1.0, 0.0),
                FPoint::new(0.0, h - 1.0),
                FPoint::new(w - 1.0, h - 1.0),
            ],
            Color::RED,
        )?;
        Ok(())
    }

    fn draw_test_lines(renderer: &Renderer, viewport: Rect) -> Result<()> {
        let (w, h) = (viewport.w as f32, viewport.h as f32);
        let top_left = FPoint::new(0.0, 0.0);
        let top_right = FPoint::new(w - 1.0, 0.0);
        let bottom_left = FPoint::new(0.0, h - 1.0);
        let bottom_right = FPoint::new(w - 1.0, h - 1.0);

        renderer
            .lines(
                &[top_left, top_right, bottom_right, bottom_left, top_left],
                Color::GREEN,
            )?
            .lines(&[top_left, bottom_left], Color::BLUE)?
            .lines(&[top_right, bottom_right], Color::BLUE)?;
        Ok(())
    }

    /// Fill a white rect in each corner and copy the sprite over it
    fn draw_test_rects(&self, renderer: &Renderer, sprite: &Texture, viewport: Rect) -> Result<()> {
        let (sw, sh) = self.sprite_size;
        let (w, h) = (viewport.w as f32, viewport.h as f32);
        let corners = [
            (1.0, 1.0),
            (w - sw - 1.0, 1.0),
            (1.0, h - sh - 1.0),
            (w - sw - 1.0, h - sh - 1.0),
        ];
        for (x, y) in corners {
            let rect = FRect::new(x, y, sw, sh);
            match self.args.render_mode {
                RenderMode::Default => {
                    renderer.fill_rects(&[rect], Color::WHITE)?;
                }
                RenderMode::Mode1 | RenderMode::Mode2 => {
                    renderer.geometry(None, &quad_triangles(rect), None)?;
                }
            }
            renderer.draw_texture(sprite, rect)?;
        }
        Ok(())
    }

    fn draw_sprites(&mut self, renderer: &Renderer, sprite: &Texture, viewport: Rect) -> Result<()> {
        if self.args.cycle_color {
            let value = self.color.step();
            sprite.set_color_mod(0xFF, value, value)?;
        }
        if self.args.cycle_alpha {
            sprite.set_alpha_mod(self.alpha.step())?;
        }

        let bounds = (viewport.w as f32, viewport.h as f32);
        let moving = self.iterations.allows_motion();
        for (position, velocity) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            if moving {
                move_sprite(position, velocity, self.sprite_size, bounds);
            }

            let rect = FRect::new(position.x, position.y, self.sprite_size.0, self.sprite_size.1);
            match self.args.render_mode {
                RenderMode::Default => {
                    renderer.draw_texture(sprite, rect)?;
                }
                RenderMode::Mode1 => {
                    renderer.geometry(Some(sprite), &quad_triangles(rect), None)?;
                }
                RenderMode::Mode2 => {
                    let (vertices, indices) = quad_fan(rect);
                    renderer.geometry(Some(sprite), &vertices, Some(&indices))?;
                }
            }
        }

        // Color changes stop with the last iteration
        if let Iterations::Count(_) = self.iterations {
            self.iterations.decrement();
            if self.iterations == Iterations::None {
                self.args.cycle_color = false;
                self.args.cycle_alpha = false;
            }
        }
        Ok(())
    }
}

impl Game for Sprite {
    fn name(&self) -> &str {
        "Sprite test"
    }

    fn window_properties(&self) -> WindowProperties {
        WindowProperties {
            title: "sdlkit test: Sprite".to_string(),
            width: 640,
            height: 480,
            ..WindowProperties::default()
        }
    }

    fn on_ready(&mut self, ctx: &mut AppContext, window: &Window) -> Result<()> {
        let renderer = window.create_renderer(None, RenderFlags::empty())?;
        let sprite = self.load_sprite(&renderer)?;
        println!("Blend mode: {}", sprite.blend_mode()?);

        let size = sprite.size()?;
        self.sprite_size = size.to_f32();
        let safe_area = renderer.safe_area()?;
        let max_x = safe_area.w - size.w;
        let max_y = safe_area.h - size.h;

        for _ in 0..self.args.count {
            let x = if max_x > 0 { self.rng.random_range(0..max_x) } else { 0 };
            let y = if max_y > 0 { self.rng.random_range(0..max_y) } else { 0 };
            self.positions.push(FPoint::new(x as f32, y as f32));
            self.velocities.push(FPoint::new(
                self.rng.random_range(-1.0..=1.0),
                self.rng.random_range(-1.0..=1.0),
            ));
        }
        log::info!("Sprite test: {} sprites of {}x{}", self.args.count, size.w, size.h);

        self.frame_counter.start(ctx, FPS_REPORT_PERIOD);
        self.renderer = Some(renderer);
        self.sprite = Some(sprite);
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut AppContext, _window: &Window, _delta_ms: u64) -> Result<()> {
        if self.suspended {
            return Ok(());
        }
        let (Some(renderer), Some(sprite)) = (self.renderer.take(), self.sprite.take()) else {
            return Ok(());
        };

        let result = self.draw_frame(&renderer, &sprite);
        self.renderer = Some(renderer);
        self.sprite = Some(sprite);
        result?;

        self.frame_counter.increment();
        Ok(())
    }

    fn on_event(&mut self, _ctx: &mut AppContext, _window: &Window, event: &Event) -> Result<()> {
        if !self.args.suspend_when_occluded {
            return Ok(());
        }
        match event {
            Event::WindowOccluded { .. } => {
                log::info!("Sprite test: suspended");
                self.suspended = true;
            }
            Event::WindowExposed { .. } => {
                log::info!("Sprite test: resumed");
                self.suspended = false;
            }
            _ => {}
        }
        Ok(())
    }

    fn on_shutdown(&mut self, _ctx: &mut AppContext) -> Result<()> {
        // Textures go before their renderer
        self.sprite = None;
        self.renderer = None;
        Ok(())
    }
}

impl Sprite {
    fn draw_frame(&mut self, renderer: &Renderer, sprite: &Texture) -> Result<()> {
        renderer.set_viewport(None)?;
        let safe_area = renderer.safe_area()?;
        renderer.set_viewport(Some(safe_area))?.clear_with(BACKGROUND)?;

        let viewport = renderer.viewport()?;
        Self::draw_test_points(renderer, viewport)?;
        Self::draw_test_lines(renderer, viewport)?;
        self.draw_test_rects(renderer, sprite, viewport)?;
        self.draw_sprites(renderer, sprite, viewport)?;
        renderer.present()
    }
}
