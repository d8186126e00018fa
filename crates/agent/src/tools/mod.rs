//! Booking tool catalog and executor

pub mod booking;
pub mod format;

pub use booking::{
    Booking, BookingStatus, BookingStore, CreateBookingArgs, GetBookingArgs, StatusFilter,
    UpdateBookingArgs,
};

use concierge_provider::{Tool, ToolCall};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// The tools the model may call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    CreateBooking,
    UpdateBooking,
    GetBooking,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [Self::CreateBooking, Self::UpdateBooking, Self::GetBooking];

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateBooking => "create_booking",
            Self::UpdateBooking => "update_booking",
            Self::GetBooking => "get_booking",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::CreateBooking => "Create a new booking for a service or appointment",
            Self::UpdateBooking => "Update an existing booking",
            Self::GetBooking => "Retrieve booking information",
        }
    }

    /// JSON schema of the arguments
    pub fn parameters(&self) -> Value {
        match self {
            Self::CreateBooking => json!({
                "type": "object",
                "properties": {
                    "service_type": {
                        "type": "string",
                        "description": "Type of service (e.g., 'gym_session', 'personal_training', 'massage', 'consultation')"
                    },
                    "date": {
                        "type": "string",
                        "description": "Date of the booking in YYYY-MM-DD format"
                    },
                    "time": {
                        "type": "string",
                        "description": "Time of the booking in HH:MM format (24-hour)"
                    },
                    "duration_minutes": {
                        "type": "integer",
                        "description": "Duration of the booking in minutes",
                        "default": 60
                    },
                    "customer_name": {
                        "type": "string",
                        "description": "Name of the customer"
                    },
                    "customer_email": {
                        "type": "string",
                        "description": "Email of the customer"
                    },
                    "notes": {
                        "type": "string",
                        "description": "Additional notes for the booking",
                        "default": ""
                    }
                },
                "required": ["service_type", "date", "time", "customer_name", "customer_email"]
            }),
            Self::UpdateBooking => json!({
                "type": "object",
                "properties": {
                    "booking_id": {
                        "type": "string",
                        "description": "The unique ID of the booking to update"
                    },
                    "date": {
                        "type": "string",
                        "description": "New date in YYYY-MM-DD format (optional)"
                    },
                    "time": {
                        "type": "string",
                        "description": "New time in HH:MM format (optional)"
                    },
                    "duration_minutes": {
                        "type": "integer",
                        "description": "New duration in minutes (optional)"
                    },
                    "status": {
                        "type": "string",
                        "enum": ["confirmed", "cancelled", "rescheduled", "completed"],
                        "description": "New status of the booking (optional)"
                    },
                    "notes": {
                        "type": "string",
                        "description": "Updated notes (optional)"
                    }
                },
                "required": ["booking_id"]
            }),
            Self::GetBooking => json!({
                "type": "object",
                "properties": {
                    "booking_id": {
                        "type": "string",
                        "description": "The unique ID of a specific booking (optional)"
                    },
                    "customer_email": {
                        "type": "string",
                        "description": "Email to search bookings by customer (optional)"
                    },
                    "date": {
                        "type": "string",
                        "description": "Date to filter bookings in YYYY-MM-DD format (optional)"
                    },
                    "status": {
                        "type": "string",
                        "enum": ["confirmed", "cancelled", "rescheduled", "completed", "all"],
                        "description": "Filter by booking status (optional)",
                        "default": "all"
                    }
                },
                "required": []
            }),
        }
    }

    pub fn definition(&self) -> Tool {
        Tool::new(self.name(), self.description(), self.parameters())
    }
}

impl FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failures that are reported back to the model instead of aborting the turn
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool execution failed: {0}")]
    MalformedArguments(String),

    #[error("Booking {0} not found")]
    BookingNotFound(String),
}

/// What a successful tool call produced
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Created(Booking),
    Updated {
        booking: Booking,
        updated_fields: Vec<&'static str>,
    },
    Found(Booking),
    Listed(Vec<Booking>),
}

impl ToolOutput {
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Created(b) => Some(format!(
                "Booking created successfully for {} on {} at {}",
                b.customer_name, b.date, b.time
            )),
            Self::Updated { updated_fields, .. } => Some(format!(
                "Booking updated successfully. Updated fields: {}",
                updated_fields.join(", ")
            )),
            Self::Found(_) | Self::Listed(_) => None,
        }
    }
}

/// Outcome of one executed tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub name: String,
    pub outcome: Result<ToolOutput, ToolError>,
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&ToolError> {
        self.outcome.as_ref().err()
    }

    /// JSON payload sent back to the model in the tool message
    pub fn payload(&self) -> Value {
        match &self.outcome {
            Ok(output) => {
                let message = output.message();
                match output {
                    ToolOutput::Created(booking) | ToolOutput::Updated { booking, .. } => json!({
                        "success": true,
                        "booking_id": booking.booking_id,
                        "message": message,
                        "booking": booking,
                    }),
                    ToolOutput::Found(booking) => json!({
                        "success": true,
                        "booking": booking,
                    }),
                    ToolOutput::Listed(bookings) => json!({
                        "success": true,
                        "count": bookings.len(),
                        "bookings": bookings,
                    }),
                }
            }
            Err(e @ ToolError::BookingNotFound(_)) => json!({
                "success": false,
                "error": e.to_string(),
            }),
            Err(e) => json!({ "error": e.to_string() }),
        }
    }

    /// Human-readable transcript line(s)
    pub fn render(&self) -> String {
        format::render(&self.outcome)
    }
}

/// The advertised tools plus the store they act on
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    store: BookingStore,
}

impl ToolCatalog {
    pub fn new(store: BookingStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &BookingStore {
        &self.store
    }

    pub fn definitions(&self) -> Vec<Tool> {
        ToolKind::ALL.iter().map(ToolKind::definition).collect()
    }

    /// Run one call. Never fails: problems come back as an error outcome.
    pub fn execute(&self, call: &ToolCall) -> ToolResult {
        let outcome = call
            .name
            .parse::<ToolKind>()
            .and_then(|kind| self.dispatch(kind, &call.arguments));

        match &outcome {
            Ok(_) => info!("tool {} ({}) succeeded", call.name, call.id),
            Err(e) => warn!("tool {} ({}) failed: {}", call.name, call.id, e),
        }

        ToolResult {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            outcome,
        }
    }

    fn dispatch(&self, kind: ToolKind, arguments: &Value) -> Result<ToolOutput, ToolError> {
        match kind {
            ToolKind::CreateBooking => {
                let args: CreateBookingArgs = parse_args(arguments)?;
                Ok(ToolOutput::Created(self.store.create(args)))
            }
            ToolKind::UpdateBooking => {
                let args: UpdateBookingArgs = parse_args(arguments)?;
                let id = args.booking_id.clone();
                self.store
                    .update(args)
                    .map(|(booking, updated_fields)| ToolOutput::Updated {
                        booking,
                        updated_fields,
                    })
                    .ok_or(ToolError::BookingNotFound(id))
            }
            ToolKind::GetBooking => {
                let args: GetBookingArgs = parse_args(arguments)?;
                match args.lookup_id() {
                    Some(id) => self
                        .store
                        .get(id)
                        .map(ToolOutput::Found)
                        .ok_or_else(|| ToolError::BookingNotFound(id.to_string())),
                    None => Ok(ToolOutput::Listed(self.store.find(&args))),
                }
            }
        }
    }
}

fn parse_args<T: DeserializeOwned>(arguments: &Value) -> Result<T, ToolError> {
    // Models sometimes send no arguments at all for parameterless calls
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments.clone()
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::MalformedArguments(e.to_string()))
}
