/// Splits a stream of results into the successes and the failures, keeping
/// the relative order of each side.
pub struct ResultList<S, E> {
	successful: Vec<S>,
	failed: Vec<E>,
}

impl<S, E> ResultList<S, E> {
	pub fn new() -> Self {
		Self { successful: Vec::new(), failed: Vec::new() }
	}
	pub fn deconstruct( self ) -> ( Vec<S>, Vec<E> ) {( self.successful, self.failed )}
}

impl<S, E> Default for ResultList<S, E> {
	fn default() -> Self { Self::new() }
}

impl<S, E> FromIterator<Result<S, E>> for ResultList<S, E> {
	fn from_iter<T: IntoIterator<Item = Result<S, E>>>( iter: T ) -> Self {
		iter.into_iter().fold( ResultList::new(), | mut acc, item | {
			match item {
				Ok( s ) => acc.successful.push( s ),
				Err( e ) => acc.failed.push( e ),
			}
			acc
		})
	}
}
