#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Manual turning core (runtime-agnostic).
//!
//! Arbitrates power feed and jog for a lathe control panel from the spindle
//! lever, joystick and rapid signals. All runtime interactions go through
//! `lathe_traits::MotionRuntime` and `lathe_traits::IndicatorPins`.
//!
//! ## Architecture
//!
//! - **Soft limits**: default envelope tightened by chuck, tailstock and custom
//!   constraints, published on change (`limits` module)
//! - **Feed path planner**: straight and taper destinations (`planner` module)
//! - **Commands**: MDI sum type rendered to the runtime dialect (`command` module)
//! - **State machine**: event derivation, transition table, entry/exit actions
//!   (`event`, `fsm`, `ManualTurningCore`)
//! - **Limit enforcement**: writes limit pins once the tool is clear (`enforcement`)
//! - **Dispatcher**: channel-fed loop with the feed-delay timer (`runner`)

pub mod builder;
pub mod command;
pub mod config;
pub mod conversions;
pub mod core;
pub mod enforcement;
pub mod error;
pub mod event;
pub mod fsm;
pub mod input;
pub mod limits;
pub mod messages;
pub mod mocks;
pub mod planner;
pub mod runner;
pub mod runtime_error;
pub mod status;
pub mod timer;
pub mod types;

pub use crate::builder::CoreBuilder;
pub use crate::command::{MdiCommand, SpindleCommand, SpindleDirection, SpindleSpeed};
pub use crate::config::{FeedCfg, JogCfg, SpindleCfg, TimingCfg};
pub use crate::core::ManualTurningCore;
pub use crate::error::{BuildError, LimitsError, PathError, Result, VcpError};
pub use crate::event::{Event, derive_event};
pub use crate::fsm::ManualTurningState;
pub use crate::input::PanelInput;
pub use crate::limits::{LimitInputs, SoftLimits, SoftLimitsHandler};
pub use crate::messages::{MessageStack, UserMessage};
pub use crate::planner::{FeedRequest, SAFE_LIMIT_MARGIN, plan_feed};
pub use crate::status::PanelStatus;
pub use crate::types::{
    CartesianPoint, JoggedAxis, JoystickDirection, JoystickFunction, Position, SpindleLever,
    SpindleMode,
};
