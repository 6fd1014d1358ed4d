//! Request, response and message types.

pub mod cached_content;
pub mod common;
pub mod content;
pub mod files;
pub mod generation;
pub mod live;
pub mod models;
pub mod safety;
pub mod tools;

pub use cached_content::{
    CachedContent, CachedContentUsageMetadata, CreateCachedContentRequest, UpdateCachedContentRequest,
};

pub use common::ListParams;

pub use content::{
    Blob, CodeExecutionResult, Content, ExecutableCode, FileData, FunctionCall, FunctionResponse,
    Part, Role,
};

pub use files::{File, FileState, FileStatus};

pub use generation::{
    BlockReason, Candidate, CitationMetadata, CitationSource, CountTokensRequest,
    CountTokensResponse, FinishReason, GenerateContentConfig, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, PromptFeedback, UsageMetadata,
};

pub use live::{
    LiveClientContent, LiveConnectConfig, LiveRealtimeInput, LiveServerContent, LiveServerGoAway,
    LiveServerMessage, LiveServerPayload, LiveServerSessionResumptionUpdate, LiveServerToolCall,
    LiveServerToolCallCancellation, LiveToolResponse, LiveUsageMetadata, SessionResumptionConfig,
};

pub use models::{Endpoint, Model};

pub use safety::{SafetyRating, SafetySetting};

pub use tools::{FunctionCallingConfig, FunctionCallingMode, FunctionDeclaration, Tool, ToolConfig};
