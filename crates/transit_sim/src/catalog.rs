//! Read-only view over the entity catalog (cities, stops, vehicle types, routes).
//!
//! The catalog is supplied by the surrounding system (persistence is an
//! external collaborator, §1); the engine only ever reads it, and a run
//! takes an owned snapshot at resolve time (§5) so concurrent catalog
//! mutation elsewhere cannot affect an in-flight run.

use std::collections::{BTreeSet, HashMap};

use crate::geodesy::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StopId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VehicleTypeId(pub u32);

#[derive(Debug, Clone)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone)]
pub struct Stop {
    pub id: StopId,
    pub city_id: CityId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Stop {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone)]
pub struct VehicleType {
    pub id: VehicleTypeId,
    pub name: String,
    pub capacity: u32,
}

/// One point of a route's polyline, before it is resolved to a stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub id: RouteId,
    pub city_id: CityId,
    pub name: String,
    pub vehicle_type_id: Option<VehicleTypeId>,
    /// Headway between successive dispatches, in minutes. Must be >= 1.
    pub interval_min: u32,
    /// Fleet size. `None` means no vehicles are assigned to this route.
    pub amount: Option<u32>,
    pub list_coord: Vec<RawPoint>,
    pub busstops: BTreeSet<StopId>,
}

impl Route {
    pub fn has_fleet(&self) -> bool {
        self.vehicle_type_id.is_some() && self.amount.map(|a| a > 0).unwrap_or(false)
    }
}

/// Read-only snapshot of the catalog entities a run needs.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cities: HashMap<CityId, City>,
    stops: HashMap<StopId, Stop>,
    vehicle_types: HashMap<VehicleTypeId, VehicleType>,
    routes: HashMap<RouteId, Route>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_city(&mut self, city: City) {
        self.cities.insert(city.id, city);
    }

    pub fn add_stop(&mut self, stop: Stop) {
        self.stops.insert(stop.id, stop);
    }

    pub fn add_vehicle_type(&mut self, vt: VehicleType) {
        self.vehicle_types.insert(vt.id, vt);
    }

    pub fn add_route(&mut self, route: Route) {
        self.routes.insert(route.id, route);
    }

    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.get(&id)
    }

    pub fn stop(&self, id: StopId) -> Option<&Stop> {
        self.stops.get(&id)
    }

    pub fn vehicle_type(&self, id: VehicleTypeId) -> Option<&VehicleType> {
        self.vehicle_types.get(&id)
    }

    /// Route by `(city_id, id)` — routes belonging to another city never resolve.
    pub fn route(&self, city_id: CityId, id: RouteId) -> Option<&Route> {
        self.routes
            .get(&id)
            .filter(|route| route.city_id == city_id)
    }

    pub fn routes_in_city(&self, city_id: CityId) -> impl Iterator<Item = &Route> {
        self.routes.values().filter(move |r| r.city_id == city_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        let mut cat = Catalog::new();
        cat.add_city(City {
            id: CityId(1),
            name: "Testville".into(),
            lat: 0.0,
            lon: 0.0,
        });
        cat.add_stop(Stop {
            id: StopId(1),
            city_id: CityId(1),
            name: "A".into(),
            lat: 0.0,
            lon: 0.0,
        });
        cat.add_route(Route {
            id: RouteId(10),
            city_id: CityId(1),
            name: "R10".into(),
            vehicle_type_id: Some(VehicleTypeId(1)),
            interval_min: 10,
            amount: Some(1),
            list_coord: vec![],
            busstops: BTreeSet::new(),
        });
        cat
    }

    #[test]
    fn route_lookup_respects_city_scoping() {
        let cat = sample_catalog();
        assert!(cat.route(CityId(1), RouteId(10)).is_some());
        assert!(cat.route(CityId(2), RouteId(10)).is_none());
        assert!(cat.route(CityId(1), RouteId(999)).is_none());
    }

    #[test]
    fn has_fleet_requires_both_vehicle_type_and_amount() {
        let mut route = sample_catalog().routes.remove(&RouteId(10)).unwrap();
        assert!(route.has_fleet());
        route.amount = None;
        assert!(!route.has_fleet());
        route.amount = Some(0);
        assert!(!route.has_fleet());
    }
}
