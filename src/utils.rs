mod partial_success ;
mod result_list ;

pub use partial_success::PartialSuccess ;
pub use result_list::ResultList ;



/// Best-effort text of a caught panic payload.
pub fn panic_message( payload: &( dyn std::any::Any + Send )) -> String {
	payload.downcast_ref::<&str>().map(| message | ( *message ).to_string() )
		.or_else(|| payload.downcast_ref::<String>().cloned() )
		.unwrap_or_else(|| "unknown panic".to_string() )
}
