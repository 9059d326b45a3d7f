pub mod assembler;
pub mod sector_config_service;

pub use assembler::SectorConfigAssembler;
pub use sector_config_service::SectorConfigService;
