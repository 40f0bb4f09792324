#![deny(clippy::all)]
#![forbid(unsafe_code)]

use std::time::{Duration, Instant};

use log::{debug, error};
use pixels::{Error, Pixels, SurfaceTexture};
use winit::event::{Event, VirtualKeyCode};
use winit::event_loop::{ControlFlow, EventLoop};
use winit_input_helper::WinitInputHelper;

use crate::auxiliary::randomizer::generate_seed;
use crate::auxiliary::window::{create_window, SCREEN_HEIGHT, SCREEN_WIDTH};

const INITIAL_FILL: f32 = 0.3;
const FRAME_TIME: Duration = Duration::from_millis(100);

pub fn run_life() -> Result<(), Error> {
    env_logger::init();
    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();
    let (window, p_width, p_height, mut _hidpi_factor) =
        create_window(
            "Conway's Game of Life",
            &event_loop);

    let surface_texture = SurfaceTexture::new(p_width, p_height, &window);

    let mut life = Life::new_random(SCREEN_WIDTH as usize, SCREEN_HEIGHT as usize);
    let mut pixels = Pixels::new(SCREEN_WIDTH, SCREEN_HEIGHT, surface_texture)?;
    let mut paused = false;
    let mut last_step = Instant::now();

    let mut draw_state: Option<bool> = None;

    event_loop.run(move |event, _, control_flow| {
        // The one and only event that winit_input_helper doesn't have for us...
        if let Event::RedrawRequested(_) = event {
            life.draw(pixels.get_frame());
            if pixels
                .render()
                .map_err(|e| error!("pixels.render() failed: {}", e))
                .is_err()
            {
                *control_flow = ControlFlow::Exit;
                return;
            }
        }

        // For everything else, for let winit_input_helper collect events to build its state.
        // It returns `true` when it is time to update our game state and request a redraw.
        if input.update(&event) {
            // Close events
            if input.key_pressed(VirtualKeyCode::Escape) || input.quit() {
                *control_flow = ControlFlow::Exit;
                return;
            }
            if input.key_pressed(VirtualKeyCode::P) {
                paused = !paused;
                match paused {
                    true => println!("paused"),
                    false => println!("unpaused"),
                }
            }
            if input.key_pressed(VirtualKeyCode::Space) {
                // Space is frame-step, so ensure we're paused
                println!("frame advanced");
                paused = true;
            }
            if input.key_pressed(VirtualKeyCode::R) {
                println!("reset with random conditions");
                life.randomize();
            }
            if input.key_pressed(VirtualKeyCode::C) {
                println!("screen cleared");
                life.clear();
            }
            // Handle mouse. This is a bit involved since support some simple
            // line drawing (mostly because it makes nice looking patterns).
            let (mouse_cell, mouse_prev_cell) = input
                .mouse()
                .map(|(mx, my)| {
                    let (dx, dy) = input.mouse_diff();
                    let prev_x = mx - dx;
                    let prev_y = my - dy;

                    let (mx_i, my_i) = pixels
                        .window_pos_to_pixel((mx, my))
                        .unwrap_or_else(|pos| pixels.clamp_pixel_pos(pos));

                    let (px_i, py_i) = pixels
                        .window_pos_to_pixel((prev_x, prev_y))
                        .unwrap_or_else(|pos| pixels.clamp_pixel_pos(pos));

                    (
                        (mx_i as isize, my_i as isize),
                        (px_i as isize, py_i as isize),
                    )
                })
                .unwrap_or_default();

            if input.mouse_pressed(0) {
                debug!("Mouse click at {:?}", mouse_cell);
                draw_state = Some(life.toggle(mouse_cell.0, mouse_cell.1));
            } else if let Some(draw_alive) = draw_state {
                let release = input.mouse_released(0);
                let held = input.mouse_held(0);
                debug!("Draw at {:?} => {:?}", mouse_prev_cell, mouse_cell);
                debug!("Mouse held {:?}, release {:?}", held, release);
                // If they either released (finishing the drawing) or are still
                // in the middle of drawing, keep going.
                if release || held {
                    debug!("Draw line of {:?}", draw_alive);
                    life.set_line(
                        mouse_prev_cell.0,
                        mouse_prev_cell.1,
                        mouse_cell.0,
                        mouse_cell.1,
                        draw_alive,
                    );
                }
                // If they let go or are otherwise not clicking anymore, stop drawing.
                if release || !held {
                    debug!("Draw end");
                    draw_state = None;
                }
            }
            // Adjust high DPI factor
            if let Some(factor) = input.scale_factor_changed() {
                _hidpi_factor = factor;
            }
            // Resize the window
            if let Some(size) = input.window_resized() {
                pixels.resize_surface(size.width, size.height);
            }
            if input.key_pressed(VirtualKeyCode::Space)
                || (!paused && last_step.elapsed() >= FRAME_TIME)
            {
                life = life.next_generation();
                last_step = Instant::now();
            }
            window.request_redraw();
        }
    });
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Cell {
    alive: bool,
}

impl Cell {
    fn new(alive: bool) -> Self {
        Self { alive }
    }

    /// The Life rule: birth on 3 neighbors, survival on 2 or 3.
    fn next_state(self, neibs: usize) -> Self {
        let alive = match (self.alive, neibs) {
            (true, 2) | (true, 3) => true,
            (false, 3) => true,
            _ => false,
        };
        Self::new(alive)
    }

    fn toggle(&mut self) {
        self.alive = !self.alive
    }

    fn set_alive(&mut self, alive: bool) {
        self.alive = alive
    }
}

#[derive(Clone, Debug)]
struct Life {
    cells: Vec<Cell>,
    width: usize,
    height: usize,
}

impl Life {
    fn new_empty(width: usize, height: usize) -> Self {
        assert!(
            width != 0 && height != 0,
            "grid dimensions must be positive, got {}x{}",
            width,
            height
        );
        let size = width.checked_mul(height).expect("grid dimensions too big");
        Self {
            cells: vec![Cell::default(); size],
            width,
            height,
        }
    }

    fn new_random(width: usize, height: usize) -> Self {
        let mut result = Self::new_empty(width, height);
        result.randomize();
        result
    }

    fn randomize(&mut self) {
        let mut rng: randomize::PCG32 = generate_seed().into();
        for c in self.cells.iter_mut() {
            let alive = randomize::f32_half_open_right(rng.next_u32()) < INITIAL_FILL;
            *c = Cell::new(alive);
        }
    }

    /// Count the live cells among the up-to-8 neighbors of (x, y).
    /// Positions outside the grid count as dead, so edge and corner
    /// cells see fewer neighbors.
    fn count_neibs(&self, x: usize, y: usize) -> usize {
        let x0 = x.saturating_sub(1);
        let y0 = y.saturating_sub(1);
        let x1 = (x + 1).min(self.width - 1);
        let y1 = (y + 1).min(self.height - 1);

        let mut count = 0;
        for ny in y0..=y1 {
            for nx in x0..=x1 {
                if (nx, ny) != (x, y) && self.cells[nx + ny * self.width].alive {
                    count += 1;
                }
            }
        }
        count
    }

    /// Apply the Life rule to every cell, producing the next generation.
    /// The current generation is only read, never written, so all
    /// neighbor counts come from a consistent snapshot.
    fn next_generation(&self) -> Self {
        let mut next = Self::new_empty(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let neibs = self.count_neibs(x, y);
                let idx = x + y * self.width;
                next.cells[idx] = self.cells[idx].next_state(neibs);
            }
        }
        next
    }

    fn clear(&mut self) {
        for c in self.cells.iter_mut() {
            *c = Cell::default();
        }
    }

    fn toggle(&mut self, x: isize, y: isize) -> bool {
        if let Some(i) = self.grid_idx(x, y) {
            let was_alive = self.cells[i].alive;
            self.cells[i].toggle();
            !was_alive
        } else {
            false
        }
    }

    fn draw(&self, screen: &mut [u8]) {
        debug_assert_eq!(screen.len(), 4 * self.cells.len());
        for (c, pix) in self.cells.iter().zip(screen.chunks_exact_mut(4)) {
            let color = if c.alive {
                [0xff, 0xff, 0xff, 0xff]
            } else {
                [0, 0, 0, 0xff]
            };
            pix.copy_from_slice(&color);
        }
    }

    fn set_line(&mut self, x0: isize, y0: isize, x1: isize, y1: isize, alive: bool) {
        // probably should do sutherland-hodgeman if this were more serious.
        // instead just clamp the start pos, and draw until moving towards the
        // end pos takes us out of bounds.
        let x0 = x0.max(0).min(self.width as isize);
        let y0 = y0.max(0).min(self.height as isize);
        for (x, y) in line_drawing::Bresenham::new((x0, y0), (x1, y1)) {
            if let Some(i) = self.grid_idx(x, y) {
                self.cells[i].set_alive(alive);
            } else {
                break;
            }
        }
    }

    fn grid_idx<I: std::convert::TryInto<usize>>(&self, x: I, y: I) -> Option<usize> {
        if let (Ok(x), Ok(y)) = (x.try_into(), y.try_into()) {
            if x < self.width && y < self.height {
                Some(x + y * self.width)
            } else {
                None
            }
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from_rows(rows: &[&[u8]]) -> Life {
        let height = rows.len();
        let width = rows[0].len();
        let mut life = Life::new_empty(width, height);
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), width);
            for (x, &v) in row.iter().enumerate() {
                life.cells[x + y * width] = Cell::new(v != 0);
            }
        }
        life
    }

    fn rows_from_grid(life: &Life) -> Vec<Vec<u8>> {
        (0..life.height)
            .map(|y| {
                (0..life.width)
                    .map(|x| life.cells[x + y * life.width].alive as u8)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn blinker_oscillates_with_period_two() {
        let vertical = grid_from_rows(&[&[0, 1, 0], &[0, 1, 0], &[0, 1, 0]]);
        let horizontal = vertical.next_generation();
        assert_eq!(
            rows_from_grid(&horizontal),
            vec![vec![0, 0, 0], vec![1, 1, 1], vec![0, 0, 0]]
        );
        let back = horizontal.next_generation();
        assert_eq!(rows_from_grid(&back), rows_from_grid(&vertical));
    }

    #[test]
    fn lone_cell_dies() {
        let life = grid_from_rows(&[&[0, 0, 0], &[0, 1, 0], &[0, 0, 0]]);
        let next = life.next_generation();
        assert!(next.cells.iter().all(|c| !c.alive));
    }

    #[test]
    fn block_is_still_life() {
        let mut life = grid_from_rows(&[
            &[0, 0, 0, 0],
            &[0, 1, 1, 0],
            &[0, 1, 1, 0],
            &[0, 0, 0, 0],
        ]);
        let start = rows_from_grid(&life);
        for _ in 0..10 {
            life = life.next_generation();
            assert_eq!(rows_from_grid(&life), start);
        }
    }

    #[test]
    fn next_generation_does_not_mutate_input() {
        let life = grid_from_rows(&[&[1, 1, 0], &[0, 1, 0], &[1, 0, 1]]);
        let before = life.cells.clone();
        let _ = life.next_generation();
        assert_eq!(life.cells, before);
    }

    #[test]
    fn dimensions_are_preserved() {
        let life = Life::new_random(7, 5);
        let next = life.next_generation();
        assert_eq!(next.width, 7);
        assert_eq!(next.height, 5);
        assert_eq!(next.cells.len(), 35);
    }

    #[test]
    fn birth_needs_exactly_three_neighbors() {
        // Center cell is dead with 2, 3, and 4 live neighbors in turn.
        let two = grid_from_rows(&[&[1, 0, 1], &[0, 0, 0], &[0, 0, 0]]);
        assert!(!two.next_generation().cells[4].alive);

        let three = grid_from_rows(&[&[1, 0, 1], &[0, 0, 0], &[0, 1, 0]]);
        assert!(three.next_generation().cells[4].alive);

        let four = grid_from_rows(&[&[1, 0, 1], &[0, 0, 0], &[1, 1, 0]]);
        assert!(!four.next_generation().cells[4].alive);
    }

    #[test]
    fn edges_are_truncated_not_wrapped() {
        // A fully live 3x3 grid: corners have 3 neighbors and survive,
        // everything else has 5 or more and dies. With wrap-around every
        // cell would see 8 neighbors and the whole grid would die at once.
        let life = grid_from_rows(&[&[1, 1, 1], &[1, 1, 1], &[1, 1, 1]]);
        let next = life.next_generation();
        assert_eq!(
            rows_from_grid(&next),
            vec![vec![1, 0, 1], vec![0, 0, 0], vec![1, 0, 1]]
        );
        // The surviving corners are then isolated and die.
        let after = next.next_generation();
        assert!(after.cells.iter().all(|c| !c.alive));
    }

    #[test]
    fn one_by_one_grid_dies() {
        let life = grid_from_rows(&[&[1]]);
        assert!(!life.next_generation().cells[0].alive);
    }

    #[test]
    fn empty_grid_stays_empty() {
        let life = Life::new_empty(5, 5);
        let next = life.next_generation();
        assert!(next.cells.iter().all(|c| !c.alive));
    }

    #[test]
    fn toggle_out_of_bounds_is_a_noop() {
        let mut life = Life::new_empty(3, 3);
        assert!(!life.toggle(-1, 0));
        assert!(!life.toggle(0, 3));
        assert!(life.cells.iter().all(|c| !c.alive));
    }

    #[test]
    fn toggle_reports_new_state() {
        let mut life = Life::new_empty(3, 3);
        assert!(life.toggle(1, 1));
        assert!(!life.toggle(1, 1));
    }

    #[test]
    fn set_line_paints_cells() {
        let mut life = Life::new_empty(5, 5);
        life.set_line(0, 2, 4, 2, true);
        for x in 0..5 {
            assert!(life.cells[x + 2 * 5].alive);
        }
    }

    #[test]
    #[should_panic(expected = "grid dimensions must be positive")]
    fn zero_dimension_panics() {
        Life::new_empty(0, 3);
    }

    #[test]
    fn draw_writes_one_rgba_pixel_per_cell() {
        let life = grid_from_rows(&[&[1, 0]]);
        let mut screen = [0_u8; 8];
        life.draw(&mut screen);
        assert_eq!(&screen[0..4], &[0xff, 0xff, 0xff, 0xff]);
        assert_eq!(&screen[4..8], &[0, 0, 0, 0xff]);
    }
}
