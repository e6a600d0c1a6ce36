// SPDX-License-Identifier: MIT
//! # tab-fit: Fit Decoded Frames to a Fixed Panel
//!
//! Scales a decoded RGB888 frame onto a display panel, rotating by 90 degrees
//! when the frame and panel orientations disagree, and centering the result
//! between black letterbox bars.
//!
//! ```text
//! 640x480 source          480x800 panel
//! ┌──────────┐            ┌──────┐
//! │          │  rotate    │██████│ <- bar
//! │  frame   │ ─────────▶ │ pic  │
//! │          │  + scale   │      │
//! └──────────┘            │██████│ <- bar
//!                         └──────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use tab_fit::{fit_rgb_cpu, plan_fit, Size, Staging};
//! use fast_image_resize::Resizer;
//!
//! let input = Size::new(4, 2);
//! let panel = Size::new(4, 4);
//! let plan = plan_fit(input, panel, true);
//! let src = vec![255u8; input.area() * 3];
//! let mut dst = vec![0u8; panel.area() * 3];
//! fit_rgb_cpu(&mut Resizer::new(), &src, &plan, &mut dst, &mut Staging::default())?;
//! # Ok::<(), tab_fit::FitError>(())
//! ```

pub mod cpu;
pub mod plan;

pub use cpu::{fit_rgb_cpu, rotate_cw, FitError, Staging};
pub use plan::{plan_fit, FitPlan, Size};
