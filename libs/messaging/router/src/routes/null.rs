use crate::error::RouteResult;
use crate::route::{RoutingTable, TupleRoute};
use tuple_types::Tuple;

/// Route with no transport behind it
///
/// Never has incoming tuples and accepts every send. Stands in for a
/// disabled transport.
#[derive(Debug)]
pub struct NullRoute {
    table: RoutingTable,
}

impl NullRoute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: RoutingTable::new(name),
        }
    }
}

impl TupleRoute for NullRoute {
    fn table(&self) -> &RoutingTable {
        &self.table
    }

    fn have_incoming(&self) -> bool {
        false
    }

    fn receive_tuple(&self) -> Option<Tuple> {
        None
    }

    fn transmit(&self, _tuple: &Tuple) -> RouteResult<()> {
        Ok(())
    }
}
