//! Transcript rendering of tool outcomes

use std::fmt::Write;

use super::{Booking, ToolError, ToolOutput};

pub fn render(outcome: &Result<ToolOutput, ToolError>) -> String {
    match outcome {
        Err(e) => format!("[Tool Error: {}]", e),
        Ok(ToolOutput::Created(b)) => format!(
            "[Booking Created Successfully]\n{}\nDuration: {} minutes",
            summary(b),
            b.duration_minutes
        ),
        Ok(output @ ToolOutput::Updated { .. }) => format!(
            "[Booking Updated Successfully]\n{}",
            output.message().unwrap_or_default()
        ),
        Ok(ToolOutput::Found(b)) => format!("[Booking Found]\n{}\nStatus: {}", summary(b), b.status),
        Ok(ToolOutput::Listed(bookings)) if bookings.is_empty() => {
            "[No bookings found matching the criteria]".to_string()
        }
        Ok(ToolOutput::Listed(bookings)) => {
            let mut text = format!("[Found {} booking(s)]\n", bookings.len());
            for b in bookings {
                let _ = write!(
                    text,
                    "\n• {} - {} on {} at {} (Status: {})",
                    b.customer_name, b.service_type, b.date, b.time, b.status
                );
            }
            text
        }
    }
}

fn summary(b: &Booking) -> String {
    format!(
        "Booking ID: {}\nCustomer: {}\nService: {}\nDate/Time: {} at {}",
        b.booking_id, b.customer_name, b.service_type, b.date, b.time
    )
}
