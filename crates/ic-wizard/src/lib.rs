//! DOM-free core of the inbound-capacity wizard: stages, the controller state
//! machine, fee estimation and the render model.

pub mod config;
pub mod controller;
pub mod fees;
pub mod format;
pub mod shortcut;
pub mod stage;
pub mod view;

pub use config::{ConfigError, SessionContext, WizardConfig};
pub use controller::{ChannelStatus, Ignored, SubmitError, Transition, UiState, WizardController};
pub use fees::{FeeDisplay, FeeEstimate, FeeInputs, RateSelector};
pub use shortcut::{KeyPress, Rebind};
pub use stage::Stage;
pub use view::{PaymentView, ProgressView, TabView, View};
