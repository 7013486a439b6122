//! Headless screen controllers. Each owns its form state and inline notice;
//! sensitive actions go through `FlowBridge`.

pub mod add_server;
pub mod create_nft_collection;
pub mod sell_nft;
pub mod settings;
pub mod state;

pub use add_server::AddServerScreen;
pub use create_nft_collection::CreateNftCollectionScreen;
pub use sell_nft::{NftCollection, SellNftScreen};
pub use settings::{DeviceSupport, SettingsScreen};
pub use state::{ScreenExit, ScreenNotice};
