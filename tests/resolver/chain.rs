use std::path::PathBuf ;
use std::sync::Arc ;
use std::sync::atomic::{ AtomicUsize, Ordering };
use live_link::{ DependencyReference, DependencyResolver, ResolveError, ResolverChain };

/// Resolves a fixed set of identifiers and counts how often it was asked.
struct Fixed {
	name: &'static str,
	known: Vec<&'static str>,
	asked: Arc<AtomicUsize>,
}

impl Fixed {
	fn new( name: &'static str, known: &[&'static str] ) -> Self {
		Self { name, known: known.to_vec(), asked: Arc::new( AtomicUsize::new( 0 )) }
	}
}

impl DependencyResolver for Fixed {
	fn name( &self ) -> &str { self.name }
	fn resolve( &self, identifier: &str ) -> Option<DependencyReference> {
		self.asked.fetch_add( 1, Ordering::SeqCst );
		self.known.contains( &identifier )
			.then(|| DependencyReference::new( identifier, PathBuf::from( self.name ).join( identifier ), self.name ))
	}
}

fn identifiers( items: &[&str] ) -> Vec<String> { items.iter().map(| item | item.to_string() ).collect() }

#[test]
fn resolver_chain_first_backend_wins() {
	let chain = ResolverChain::new()
		.with_resolver( Fixed::new( "first", &[ "shared" ]))
		.with_resolver( Fixed::new( "second", &[ "shared", "only-second" ]));

	assert_eq!( chain.len(), 2 );
	assert_eq!( chain.resolve( "shared" ).map(| reference | reference.resolver().to_string() ), Some( "first".to_string() ));
	assert_eq!( chain.resolve( "only-second" ).map(| reference | reference.resolver().to_string() ), Some( "second".to_string() ));
	assert!( chain.resolve( "nobody" ).is_none() );
}

#[test]
fn resolver_chain_stops_at_first_hit() {
	let second = Fixed::new( "second", &[ "a" ]);
	let asked = Arc::clone( &second.asked );
	let chain = ResolverChain::new()
		.with_resolver( Fixed::new( "first", &[ "a" ]))
		.with_resolver( second );

	chain.resolve( "a" ).expect( "Expected a to resolve" );
	assert_eq!( asked.load( Ordering::SeqCst ), 0 );
}

#[test]
fn resolver_chain_resolves_all_in_order() {
	let chain = ResolverChain::new().with_resolver( Fixed::new( "fixed", &[ "a", "b", "c" ]));
	let resolved = chain.resolve_all( &identifiers( &[ "c", "a", "b" ])).expect( "Expected every identifier to resolve" );
	let names = resolved.iter().map( DependencyReference::identifier ).collect::<Vec<_>>();
	assert_eq!( names, [ "c", "a", "b" ]);
}

#[test]
fn resolver_chain_aggregates_unresolved() {
	let backend = Fixed::new( "fixed", &[ "present" ]);
	let asked = Arc::clone( &backend.asked );
	let chain = ResolverChain::new().with_resolver( backend );

	match chain.resolve_all( &identifiers( &[ "missing-a", "present", "missing-b" ])) {
		Err( err @ ResolveError::Unresolved( _ )) => {
			assert_eq!( err.unresolved(), [ "missing-a", "missing-b" ]);
			assert!( err.to_string().contains( "missing-a, missing-b" ), "{}", err );
		}
		value => panic!( "Expected Unresolved error, found: {:#?}", value ),
	}
	assert_eq!( asked.load( Ordering::SeqCst ), 3 );
}

#[test]
fn resolver_chain_empty_resolves_nothing() {
	let chain = ResolverChain::new();
	assert!( chain.is_empty() );
	assert!( chain.resolve_all( &identifiers( &[] )).expect( "Nothing to resolve" ).is_empty() );
	assert!( chain.resolve_all( &identifiers( &[ "x" ])).is_err() );
}
