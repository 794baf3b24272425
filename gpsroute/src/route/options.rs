//! Route options and their merge rules.
//!
//! Options form a small hierarchy of kinds, encoded as bit flags so that
//! "is a" checks are a mask test:
//!
//! ```text
//!   Basic      0b000001
//!   Road       0b000010
//!   Truck      0b000110   (is a Road)
//!   Thrilling  0b001010   (is a Road)
//!   Bike       0b010000
//!   Pedestrian 0b100000
//! ```
//!
//! Merging another options value into `self` always merges the common
//! part, then merges kind-specific fields only when `self` is a kind of
//! the other value's kind.

use std::collections::{BTreeMap, BTreeSet};

/// Vehicle used for a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VehicleType {
    #[default]
    Default,
    Car,
    Truck,
    Bike,
    Motorbike,
    Pedestrian,
    Campervan,
    Bus,
}

impl VehicleType {
    pub const ALL: [VehicleType; 8] = [
        VehicleType::Default,
        VehicleType::Car,
        VehicleType::Truck,
        VehicleType::Bike,
        VehicleType::Motorbike,
        VehicleType::Pedestrian,
        VehicleType::Campervan,
        VehicleType::Bus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VehicleType::Default => "default",
            VehicleType::Car => "car",
            VehicleType::Truck => "truck",
            VehicleType::Bike => "bike",
            VehicleType::Motorbike => "motorbike",
            VehicleType::Pedestrian => "pedestrian",
            VehicleType::Campervan => "campervan",
            VehicleType::Bus => "bus",
        }
    }

    /// Parses a vehicle name as written by [`VehicleType::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(VehicleType::Default),
            "car" => Some(VehicleType::Car),
            "truck" => Some(VehicleType::Truck),
            "bike" => Some(VehicleType::Bike),
            "motorbike" => Some(VehicleType::Motorbike),
            "pedestrian" => Some(VehicleType::Pedestrian),
            "campervan" => Some(VehicleType::Campervan),
            "bus" => Some(VehicleType::Bus),
            _ => None,
        }
    }
}

/// How the route should be optimized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItineraryType {
    #[default]
    Recommended,
    Quickest,
    Shortest,
    Sightseeing,
    Economical,
    Thrilling,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TruckCategory {
    #[default]
    NoCategory,
    Hazardous,
    HazardousWater,
    Explosive,
}

/// Three-level preference used by thrilling routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Degree {
    Low,
    #[default]
    Normal,
    High,
}

/// Kind discriminator of [`RouteOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionsKind {
    Basic,
    Road,
    Truck,
    Thrilling,
    Bike,
    Pedestrian,
}

impl OptionsKind {
    pub fn bits(&self) -> u8 {
        match self {
            OptionsKind::Basic => 0b000001,
            OptionsKind::Road => 0b000010,
            OptionsKind::Truck => 0b000110,
            OptionsKind::Thrilling => 0b001010,
            OptionsKind::Bike => 0b010000,
            OptionsKind::Pedestrian => 0b100000,
        }
    }

    /// True when `self` is `other` or a refinement of it.
    pub fn is_a(&self, other: OptionsKind) -> bool {
        self.bits() & other.bits() == other.bits()
    }

    /// Natural options kind for a vehicle.
    pub fn for_vehicle(vehicle: VehicleType) -> Self {
        match vehicle {
            VehicleType::Car => OptionsKind::Road,
            VehicleType::Truck => OptionsKind::Truck,
            VehicleType::Pedestrian => OptionsKind::Pedestrian,
            VehicleType::Bike => OptionsKind::Bike,
            VehicleType::Motorbike => OptionsKind::Thrilling,
            VehicleType::Default | VehicleType::Campervan | VehicleType::Bus => {
                OptionsKind::Basic
            }
        }
    }
}

/// Fields shared by every options kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonOptions {
    pub itinerary: ItineraryType,
    /// When set, every chunk of a request folds into a single route.
    pub linked: bool,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            itinerary: ItineraryType::Recommended,
            linked: true,
        }
    }
}

impl CommonOptions {
    fn merge(&mut self, other: &CommonOptions) {
        if self.itinerary == ItineraryType::Recommended {
            self.itinerary = other.itinerary;
        }
        self.linked |= other.linked;
    }
}

/// Which road features a route may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadOptions {
    pub highways: bool,
    pub tolls: bool,
    pub boat_ferries: bool,
    pub rail_ferries: bool,
    pub tunnels: bool,
    pub dirt_roads: bool,
}

impl Default for RoadOptions {
    fn default() -> Self {
        Self {
            highways: true,
            tolls: true,
            boat_ferries: true,
            rail_ferries: true,
            tunnels: true,
            dirt_roads: true,
        }
    }
}

impl RoadOptions {
    fn merge(&mut self, other: &RoadOptions) {
        self.highways |= other.highways;
        self.tolls |= other.tolls;
        self.boat_ferries |= other.boat_ferries;
        self.rail_ferries |= other.rail_ferries;
        self.tunnels |= other.tunnels;
        self.dirt_roads |= other.dirt_roads;
    }
}

/// Truck restrictions. Dimensions are in centimeters, weights in kilograms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TruckOptions {
    pub road: RoadOptions,
    pub category: TruckCategory,
    pub tractor: bool,
    pub trailers: u32,
    pub axles: u32,
    pub limited_weight: u32,
    pub weight_per_axle: u32,
    pub height: u32,
    pub width: u32,
    pub length: u32,
}

impl TruckOptions {
    fn merge(&mut self, other: &TruckOptions) {
        self.road.merge(&other.road);
        if self.category == TruckCategory::NoCategory {
            self.category = other.category;
        }
        self.tractor |= other.tractor;
        self.trailers = self.trailers.max(other.trailers);
        self.axles = self.axles.max(other.axles);
        self.limited_weight = self.limited_weight.max(other.limited_weight);
        self.weight_per_axle = self.weight_per_axle.max(other.weight_per_axle);
        self.height = self.height.max(other.height);
        self.width = self.width.max(other.width);
        self.length = self.length.max(other.length);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrillingOptions {
    pub road: RoadOptions,
    pub already_used_roads: bool,
    pub hilliness: Degree,
    pub windingness: Degree,
}

impl Default for ThrillingOptions {
    fn default() -> Self {
        Self {
            road: RoadOptions::default(),
            already_used_roads: true,
            hilliness: Degree::Normal,
            windingness: Degree::Normal,
        }
    }
}

impl ThrillingOptions {
    fn merge(&mut self, other: &ThrillingOptions) {
        self.road.merge(&other.road);
        self.already_used_roads |= other.already_used_roads;
        if self.hilliness == Degree::Normal {
            self.hilliness = other.hilliness;
        }
        if self.windingness == Degree::Normal {
            self.windingness = other.windingness;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PedestrianOptions {
    pub parks: bool,
}

/// Kind-specific part of [`RouteOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionDetails {
    Basic,
    Road(RoadOptions),
    Truck(TruckOptions),
    Thrilling(ThrillingOptions),
    Bike,
    Pedestrian(PedestrianOptions),
}

/// Options attached to a request and to every route it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOptions {
    pub common: CommonOptions,
    pub details: OptionDetails,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self::basic()
    }
}

impl RouteOptions {
    pub fn basic() -> Self {
        Self::of_kind(OptionsKind::Basic)
    }

    pub fn road() -> Self {
        Self::of_kind(OptionsKind::Road)
    }

    pub fn truck() -> Self {
        Self::of_kind(OptionsKind::Truck)
    }

    pub fn thrilling() -> Self {
        Self::of_kind(OptionsKind::Thrilling)
    }

    pub fn bike() -> Self {
        Self::of_kind(OptionsKind::Bike)
    }

    pub fn pedestrian() -> Self {
        Self::of_kind(OptionsKind::Pedestrian)
    }

    /// Default options of the given kind.
    pub fn of_kind(kind: OptionsKind) -> Self {
        let details = match kind {
            OptionsKind::Basic => OptionDetails::Basic,
            OptionsKind::Road => OptionDetails::Road(RoadOptions::default()),
            OptionsKind::Truck => OptionDetails::Truck(TruckOptions::default()),
            OptionsKind::Thrilling => OptionDetails::Thrilling(ThrillingOptions::default()),
            OptionsKind::Bike => OptionDetails::Bike,
            OptionsKind::Pedestrian => OptionDetails::Pedestrian(PedestrianOptions::default()),
        };
        Self {
            common: CommonOptions::default(),
            details,
        }
    }

    /// Default options for a vehicle's natural kind.
    pub fn for_vehicle(vehicle: VehicleType) -> Self {
        Self::of_kind(OptionsKind::for_vehicle(vehicle))
    }

    /// Builds options from what a provider advertises for a vehicle,
    /// taking each parameter's advertised default.
    pub fn from_accepted(accepted: &AcceptedRouteOptions) -> Self {
        let mut options = Self::of_kind(accepted.kind);
        options.common.linked = accepted.linked.default;
        options.common.itinerary = accepted.itineraries.default;

        if let (Some(road), Some(flags)) = (options.road_mut(), accepted.road.as_ref()) {
            road.highways = flags.highways.default;
            road.tolls = flags.tolls.default;
            road.boat_ferries = flags.boat_ferries.default;
            road.rail_ferries = flags.rail_ferries.default;
            road.tunnels = flags.tunnels.default;
            road.dirt_roads = flags.dirt_roads.default;
        }
        options
    }

    pub fn kind(&self) -> OptionsKind {
        match self.details {
            OptionDetails::Basic => OptionsKind::Basic,
            OptionDetails::Road(_) => OptionsKind::Road,
            OptionDetails::Truck(_) => OptionsKind::Truck,
            OptionDetails::Thrilling(_) => OptionsKind::Thrilling,
            OptionDetails::Bike => OptionsKind::Bike,
            OptionDetails::Pedestrian(_) => OptionsKind::Pedestrian,
        }
    }

    pub fn is_a(&self, kind: OptionsKind) -> bool {
        self.kind().is_a(kind)
    }

    pub fn is_linked(&self) -> bool {
        self.common.linked
    }

    pub fn with_linked(mut self, linked: bool) -> Self {
        self.common.linked = linked;
        self
    }

    pub fn with_itinerary(mut self, itinerary: ItineraryType) -> Self {
        self.common.itinerary = itinerary;
        self
    }

    /// Road flags, present for Road and its refinements.
    pub fn road_options(&self) -> Option<&RoadOptions> {
        match &self.details {
            OptionDetails::Road(road) => Some(road),
            OptionDetails::Truck(truck) => Some(&truck.road),
            OptionDetails::Thrilling(thrilling) => Some(&thrilling.road),
            _ => None,
        }
    }

    pub fn road_mut(&mut self) -> Option<&mut RoadOptions> {
        match &mut self.details {
            OptionDetails::Road(road) => Some(road),
            OptionDetails::Truck(truck) => Some(&mut truck.road),
            OptionDetails::Thrilling(thrilling) => Some(&mut thrilling.road),
            _ => None,
        }
    }

    /// Merges `other` into `self`.
    ///
    /// Kind-specific fields are combined only when `self` is a kind of
    /// `other`; a Truck absorbs a Road's flags, a Road ignores a Truck's.
    pub fn merge(&mut self, other: &RouteOptions) {
        self.common.merge(&other.common);

        if !self.is_a(other.kind()) {
            return;
        }

        if let OptionDetails::Road(theirs) = &other.details {
            if let Some(mine) = self.road_mut() {
                mine.merge(theirs);
            }
            return;
        }

        match (&mut self.details, &other.details) {
            (OptionDetails::Truck(mine), OptionDetails::Truck(theirs)) => mine.merge(theirs),
            (OptionDetails::Thrilling(mine), OptionDetails::Thrilling(theirs)) => {
                mine.merge(theirs)
            }
            (OptionDetails::Pedestrian(mine), OptionDetails::Pedestrian(theirs)) => {
                mine.parks |= theirs.parks
            }
            _ => {}
        }
    }
}

/// Whether a provider honors a parameter, and the value it assumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter<A, D = A> {
    pub accepted: A,
    pub default: D,
}

impl<A, D> Parameter<A, D> {
    pub fn new(accepted: A, default: D) -> Self {
        Self { accepted, default }
    }
}

/// Road flags a provider lets callers toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedRoadOptions {
    pub highways: Parameter<bool>,
    pub tolls: Parameter<bool>,
    pub boat_ferries: Parameter<bool>,
    pub rail_ferries: Parameter<bool>,
    pub tunnels: Parameter<bool>,
    pub dirt_roads: Parameter<bool>,
}

impl AcceptedRoadOptions {
    /// No flag can be toggled; every road feature is allowed.
    pub fn fixed() -> Self {
        let fixed = Parameter::new(false, true);
        Self {
            highways: fixed.clone(),
            tolls: fixed.clone(),
            boat_ferries: fixed.clone(),
            rail_ferries: fixed.clone(),
            tunnels: fixed.clone(),
            dirt_roads: fixed,
        }
    }
}

/// Options a provider supports for one vehicle type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedRouteOptions {
    pub kind: OptionsKind,
    /// The provider can return geometry suitable for previews.
    pub preview: bool,
    pub linked: Parameter<bool>,
    pub itineraries: Parameter<BTreeSet<ItineraryType>, ItineraryType>,
    pub road: Option<AcceptedRoadOptions>,
}

impl AcceptedRouteOptions {
    /// Plain routing with the recommended itinerary only.
    pub fn basic(kind: OptionsKind) -> Self {
        Self {
            kind,
            preview: true,
            linked: Parameter::new(true, true),
            itineraries: Parameter::new(
                BTreeSet::from([ItineraryType::Recommended]),
                ItineraryType::Recommended,
            ),
            road: None,
        }
    }

    /// Basic routing on a road kind with fixed road flags.
    pub fn basic_road(kind: OptionsKind) -> Self {
        Self {
            road: Some(AcceptedRoadOptions::fixed()),
            ..Self::basic(kind)
        }
    }

    pub fn with_road(mut self, road: AcceptedRoadOptions) -> Self {
        self.road = Some(road);
        self
    }
}

/// Per-vehicle table of supported options.
pub type TravelOptions = BTreeMap<VehicleType, AcceptedRouteOptions>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_hierarchy() {
        assert!(OptionsKind::Truck.is_a(OptionsKind::Road));
        assert!(OptionsKind::Thrilling.is_a(OptionsKind::Road));
        assert!(!OptionsKind::Road.is_a(OptionsKind::Truck));
        assert!(!OptionsKind::Basic.is_a(OptionsKind::Road));
        assert!(!OptionsKind::Bike.is_a(OptionsKind::Road));
        assert!(OptionsKind::Pedestrian.is_a(OptionsKind::Pedestrian));
    }

    #[test]
    fn test_kind_for_vehicle() {
        assert_eq!(OptionsKind::for_vehicle(VehicleType::Car), OptionsKind::Road);
        assert_eq!(OptionsKind::for_vehicle(VehicleType::Truck), OptionsKind::Truck);
        assert_eq!(
            OptionsKind::for_vehicle(VehicleType::Motorbike),
            OptionsKind::Thrilling
        );
        assert_eq!(OptionsKind::for_vehicle(VehicleType::Bike), OptionsKind::Bike);
        assert_eq!(
            OptionsKind::for_vehicle(VehicleType::Pedestrian),
            OptionsKind::Pedestrian
        );
        assert_eq!(
            OptionsKind::for_vehicle(VehicleType::Default),
            OptionsKind::Basic
        );
    }

    #[test]
    fn test_defaults() {
        let road = RouteOptions::road();
        assert!(road.is_linked());
        assert_eq!(road.common.itinerary, ItineraryType::Recommended);
        assert_eq!(road.road_options(), Some(&RoadOptions::default()));
        assert!(road.road_options().unwrap().dirt_roads);

        match RouteOptions::thrilling().details {
            OptionDetails::Thrilling(t) => {
                assert!(t.already_used_roads);
                assert_eq!(t.hilliness, Degree::Normal);
            }
            other => panic!("unexpected details {:?}", other),
        }

        match RouteOptions::pedestrian().details {
            OptionDetails::Pedestrian(p) => assert!(!p.parks),
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_itinerary_merge_prefers_explicit() {
        let mut recommended = RouteOptions::road();
        recommended.merge(&RouteOptions::road().with_itinerary(ItineraryType::Quickest));
        assert_eq!(recommended.common.itinerary, ItineraryType::Quickest);

        let mut shortest = RouteOptions::road().with_itinerary(ItineraryType::Shortest);
        shortest.merge(&RouteOptions::road().with_itinerary(ItineraryType::Quickest));
        assert_eq!(shortest.common.itinerary, ItineraryType::Shortest);
    }

    #[test]
    fn test_linked_is_or_ed() {
        let mut unlinked = RouteOptions::basic().with_linked(false);
        unlinked.merge(&RouteOptions::basic().with_linked(true));
        assert!(unlinked.is_linked());
    }

    #[test]
    fn test_road_flags_or_ed() {
        let mut a = RouteOptions::road();
        let mut b = RouteOptions::road();
        {
            let ra = a.road_mut().unwrap();
            ra.tolls = false;
            ra.tunnels = false;
        }
        b.road_mut().unwrap().tunnels = false;

        a.merge(&b);
        let merged = a.road_options().unwrap();
        assert!(merged.tolls);
        assert!(!merged.tunnels);
    }

    #[test]
    fn test_truck_merge_takes_max_and_fills_category() {
        let mut a = RouteOptions::truck();
        let mut b = RouteOptions::truck();
        if let OptionDetails::Truck(t) = &mut a.details {
            t.height = 350;
            t.axles = 2;
        }
        if let OptionDetails::Truck(t) = &mut b.details {
            t.height = 400;
            t.axles = 1;
            t.tractor = true;
            t.category = TruckCategory::Explosive;
        }

        a.merge(&b);
        match a.details {
            OptionDetails::Truck(t) => {
                assert_eq!(t.height, 400);
                assert_eq!(t.axles, 2);
                assert!(t.tractor);
                assert_eq!(t.category, TruckCategory::Explosive);
            }
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_truck_absorbs_road_flags() {
        let mut truck = RouteOptions::truck();
        truck.road_mut().unwrap().tolls = false;
        let road = RouteOptions::road();

        truck.merge(&road);
        assert!(truck.road_options().unwrap().tolls);
    }

    #[test]
    fn test_road_ignores_truck_details() {
        let mut road = RouteOptions::road();
        road.road_mut().unwrap().tolls = false;
        let truck = RouteOptions::truck();

        road.merge(&truck);
        assert!(!road.road_options().unwrap().tolls);
        assert_eq!(road.kind(), OptionsKind::Road);
    }

    #[test]
    fn test_thrilling_degree_merge() {
        let mut a = RouteOptions::thrilling();
        let mut b = RouteOptions::thrilling();
        if let OptionDetails::Thrilling(t) = &mut b.details {
            t.hilliness = Degree::High;
            t.windingness = Degree::Low;
        }
        a.merge(&b);
        match a.details {
            OptionDetails::Thrilling(t) => {
                assert_eq!(t.hilliness, Degree::High);
                assert_eq!(t.windingness, Degree::Low);
            }
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut truck = RouteOptions::truck().with_itinerary(ItineraryType::Shortest);
        if let OptionDetails::Truck(t) = &mut truck.details {
            t.width = 250;
            t.category = TruckCategory::Hazardous;
        }
        truck.road_mut().unwrap().highways = false;

        let mut merged = truck;
        merged.merge(&truck);
        assert_eq!(merged, truck);
    }

    #[test]
    fn test_from_accepted() {
        let mut accepted = AcceptedRouteOptions::basic_road(OptionsKind::Road);
        accepted.linked = Parameter::new(true, false);
        accepted.road.as_mut().unwrap().tolls = Parameter::new(true, false);

        let options = RouteOptions::from_accepted(&accepted);
        assert_eq!(options.kind(), OptionsKind::Road);
        assert!(!options.is_linked());
        assert!(!options.road_options().unwrap().tolls);
        assert!(options.road_options().unwrap().highways);
    }
}
