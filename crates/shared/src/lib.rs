//! Taleweaver wire types - request and response bodies of the engine's HTTP
//! API, plus the template transfer document.
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - only serde and serde_json
//! 2. **No business logic** - pure data types and serialization
//! 3. **No domain IDs** - store ids travel as raw `i64`, users as strings

pub mod requests;
pub mod responses;
pub mod transfer;

pub use requests::{
    CreateHeroRequest, HeroData, HeroPromptRequest, HeroSystemChoice, HeroTechniqueChoice,
};
pub use responses::{
    CreateHeroResponse, ErrorResponse, HeroPromptResponse, HistoryEntryDto, ImportTemplateResponse,
    RollbackResponse, RunSummaryDto, StartRunResponse, TemplateSummaryDto,
};
pub use transfer::{
    ExportAdventure, ExportCharacter, ExportCharacterFaction, ExportCharacterSystem,
    ExportCharacterTechnique, ExportEvent, ExportFaction, ExportHeroSetup, ExportLocation,
    ExportOtherInfo, ExportRace, ExportRelationship, ExportSystem, ExportTechnique,
    TemplateExport, TEMPLATE_EXPORT_VERSION,
};
