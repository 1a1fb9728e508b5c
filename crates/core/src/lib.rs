pub mod audit;
pub mod config;
pub mod device;
pub mod hardware;
pub mod ledger;
pub mod machine;
pub mod metrics;
pub mod multiball;
pub mod player;
pub mod testing;
pub mod timers;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use device::{DeviceConfig, EjectStrategy, PlanetDevice, RecoveryOutcome};
pub use hardware::{Actuators, Coil, Switch, SwitchEvent, SwitchState};
pub use ledger::{BallLedger, FeedLauncher, LaunchPlan, LaunchRequest};
pub use machine::{Machine, MachineError, MachineSnapshot};
pub use multiball::{MultiballConfig, Notification, NotificationCallback};
pub use player::{MemoryPlayerStore, PlayerStore};
