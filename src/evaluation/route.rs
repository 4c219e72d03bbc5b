//! Route feasibility walk with optional station repair.

use serde::{Deserialize, Serialize};

use crate::error::GvrpError;
use crate::models::{GvrpProblem, Stop, Vehicle, Violation, ViolationType, Visit};
use crate::resource::ResourceModel;

const EPS: f64 = 1e-9;

/// How the evaluator reacts to a leg that the remaining range cannot cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Insert compatible stations before unreachable legs.
    #[default]
    Repair,
    /// Record a [`ViolationType::RangeExceeded`] and keep walking.
    CheckOnly,
}

/// Diagnostic slack of a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSlack {
    /// Unused capacity at the end of the route.
    pub capacity: i32,
    /// Range left when returning to the depot.
    pub final_range: f64,
    /// Smallest range on arrival anywhere along the route.
    pub min_range: f64,
}

/// Outcome of walking one vehicle's stop sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEvaluation {
    pub vehicle_id: usize,
    /// Stops actually driven, including repair stations.
    pub stops: Vec<Stop>,
    /// Per-stop timeline, aligned with `stops`.
    pub visits: Vec<Visit>,
    pub distance: f64,
    pub emissions: f64,
    pub travel_time: f64,
    pub replenish_time: f64,
    /// Total load delivered.
    pub load: i32,
    pub slack: RouteSlack,
    pub violations: Vec<Violation>,
}

impl RouteEvaluation {
    /// Returns `true` if no constraint is violated.
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    /// Travel plus replenishment time.
    pub fn total_time(&self) -> f64 {
        self.travel_time + self.replenish_time
    }

    /// Number of station stops driven.
    pub fn station_visits(&self) -> usize {
        self.stops.iter().filter(|s| s.is_station()).count()
    }
}

/// Walks a stop sequence for one vehicle, tracking load, range, and time.
///
/// The depot bound to the vehicle is implicit at both ends. Explicit station
/// stops recharge to full. In [`EvaluationMode::Repair`] the evaluator
/// inserts the cheapest compatible station (or a chain of them) before any
/// leg the remaining range cannot cover, and refuels before a customer that
/// would otherwise leave the vehicle stranded. Capacity overflow is always
/// recorded, never repaired.
///
/// # Examples
///
/// ```
/// use u_gvrp::models::{Customer, Depot, GvrpProblem, Station, StationKind, Stop, Vehicle, VehicleType};
/// use u_gvrp::evaluation::{EvaluationMode, RouteEvaluator};
/// use u_gvrp::resource::LinearResourceModel;
///
/// let problem = GvrpProblem::new(
///     vec![Depot::new(0, 0.0, 0.0)],
///     vec![Customer::new(1, 10.0, 0.0, 5)],
///     vec![Station::new(0, 5.0, 0.0, StationKind::Standard)],
///     vec![Vehicle::new(0, VehicleType::Electric, 10, 12.0)],
/// )
/// .unwrap();
///
/// let evaluator = RouteEvaluator::new(&problem, &LinearResourceModel, EvaluationMode::Repair);
/// let eval = evaluator.evaluate(0, &[Stop::Customer(1)]).unwrap();
/// assert!(eval.is_feasible());
/// assert_eq!(eval.stops, vec![Stop::Station(0), Stop::Customer(1), Stop::Station(0)]);
/// assert!((eval.distance - 20.0).abs() < 1e-10);
/// ```
#[derive(Clone, Copy)]
pub struct RouteEvaluator<'a> {
    problem: &'a GvrpProblem,
    resources: &'a dyn ResourceModel,
    mode: EvaluationMode,
}

impl<'a> RouteEvaluator<'a> {
    /// Creates an evaluator over a problem snapshot.
    pub fn new(
        problem: &'a GvrpProblem,
        resources: &'a dyn ResourceModel,
        mode: EvaluationMode,
    ) -> Self {
        Self {
            problem,
            resources,
            mode,
        }
    }

    /// Repair or check-only.
    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Problem whose routes are walked.
    pub fn problem(&self) -> &'a GvrpProblem {
        self.problem
    }

    /// Evaluates `stops` driven by `vehicle_id`.
    ///
    /// Fails only on unknown vehicle, customer, or station ids. Constraint
    /// violations are reported in the returned evaluation.
    pub fn evaluate(&self, vehicle_id: usize, stops: &[Stop]) -> Result<RouteEvaluation, GvrpError> {
        let vidx = self.problem.vehicle_index(vehicle_id)?;
        let vehicle = &self.problem.vehicles()[vidx];
        let depot = self.problem.vehicle_depot_node(vidx);
        let resolved = stops
            .iter()
            .map(|&s| self.resolve(s))
            .collect::<Result<Vec<_>, _>>()?;

        let mut walk = Walk::new(self, vehicle, depot);
        if resolved.is_empty() {
            return Ok(walk.finish());
        }
        for (i, target) in resolved.iter().enumerate() {
            let next = resolved.get(i + 1).map_or(depot, |t| t.node);
            if self.mode == EvaluationMode::Repair {
                walk.repair_leg(target.node)?;
                if let Stop::Customer(_) = target.stop {
                    walk.look_ahead(target.node, next)?;
                }
            }
            walk.travel(target.node);
            match target.stop {
                Stop::Customer(id) => walk.serve(id, self.problem.customers()[target.idx].demand()),
                Stop::Station(_) => walk.replenish(target.idx)?,
            }
        }
        if self.mode == EvaluationMode::Repair {
            walk.repair_leg(depot)?;
        }
        walk.travel(depot);
        Ok(walk.finish())
    }

    fn resolve(&self, stop: Stop) -> Result<Target, GvrpError> {
        let (idx, node) = match stop {
            Stop::Customer(id) => {
                let idx = self.problem.customer_index(id)?;
                (idx, self.problem.customer_node(idx))
            }
            Stop::Station(id) => {
                let idx = self.problem.station_index(id)?;
                (idx, self.problem.station_node(idx))
            }
        };
        Ok(Target { stop, idx, node })
    }
}

struct Target {
    stop: Stop,
    idx: usize,
    node: usize,
}

/// Mutable state of one route walk.
struct Walk<'e, 'a> {
    eval: &'e RouteEvaluator<'a>,
    vehicle: &'a Vehicle,
    node: usize,
    range: f64,
    load: i32,
    time: f64,
    distance: f64,
    emissions: f64,
    travel_time: f64,
    replenish_time: f64,
    min_range: f64,
    overloaded: bool,
    stops: Vec<Stop>,
    visits: Vec<Visit>,
    violations: Vec<Violation>,
}

impl<'e, 'a> Walk<'e, 'a> {
    fn new(eval: &'e RouteEvaluator<'a>, vehicle: &'a Vehicle, depot: usize) -> Self {
        Self {
            eval,
            vehicle,
            node: depot,
            range: vehicle.max_range(),
            load: 0,
            time: 0.0,
            distance: 0.0,
            emissions: 0.0,
            travel_time: 0.0,
            replenish_time: 0.0,
            min_range: vehicle.max_range(),
            overloaded: false,
            stops: Vec::new(),
            visits: Vec::new(),
            violations: Vec::new(),
        }
    }

    fn need(&self, from: usize, to: usize) -> f64 {
        let d = self.eval.problem.distance(from, to);
        self.eval.resources.consumption(self.vehicle, d)
    }

    fn travel(&mut self, to: usize) {
        let problem = self.eval.problem;
        let d = problem.distance(self.node, to);
        let need = self.eval.resources.consumption(self.vehicle, d);
        if need > self.range + EPS {
            self.violations
                .push(Violation::new(ViolationType::RangeExceeded {
                    vehicle_id: self.vehicle.id(),
                    from: problem.node_location_id(self.node),
                    to: problem.node_location_id(to),
                    required: need,
                    available: self.range,
                }));
            self.range = 0.0;
        } else {
            self.range = (self.range - need).max(0.0);
        }
        let t = d / self.vehicle.speed();
        self.distance += d;
        self.emissions += self.eval.resources.emissions(self.vehicle, d);
        self.travel_time += t;
        self.time += t;
        self.node = to;
        self.min_range = self.min_range.min(self.range);
    }

    fn serve(&mut self, customer_id: usize, demand: i32) {
        self.load += demand;
        if self.load > self.vehicle.capacity() && !self.overloaded {
            self.overloaded = true;
            self.violations
                .push(Violation::new(ViolationType::CapacityExceeded {
                    vehicle_id: self.vehicle.id(),
                    customer_id,
                    load: self.load,
                    capacity: self.vehicle.capacity(),
                }));
        }
        self.stops.push(Stop::Customer(customer_id));
        self.visits.push(Visit {
            stop: Stop::Customer(customer_id),
            arrival_time: self.time,
            departure_time: self.time,
            load_after: self.load,
            range_on_arrival: self.range,
            range_on_departure: self.range,
        });
    }

    fn replenish(&mut self, station_idx: usize) -> Result<(), GvrpError> {
        let station = &self.eval.problem.stations()[station_idx];
        let arrival_time = self.time;
        let range_on_arrival = self.range;
        if station.serves(self.vehicle.vehicle_type()) {
            let amount = self.vehicle.max_range() - self.range;
            let t = self
                .eval
                .resources
                .replenish_time(self.vehicle, station, amount)?;
            self.time += t;
            self.replenish_time += t;
            self.range = self.vehicle.max_range();
        } else {
            self.violations
                .push(Violation::new(ViolationType::IncompatibleStation {
                    vehicle_id: self.vehicle.id(),
                    station_id: station.id(),
                }));
        }
        self.stops.push(Stop::Station(station.id()));
        self.visits.push(Visit {
            stop: Stop::Station(station.id()),
            arrival_time,
            departure_time: self.time,
            load_after: self.load,
            range_on_arrival,
            range_on_departure: self.range,
        });
        Ok(())
    }

    /// Drives through a station chain if `target` is out of range.
    fn repair_leg(&mut self, target: usize) -> Result<(), GvrpError> {
        if self.need(self.node, target) <= self.range + EPS {
            return Ok(());
        }
        if let Some(chain) = self.station_chain(target) {
            for s in chain {
                self.travel(self.eval.problem.station_node(s));
                self.replenish(s)?;
            }
        }
        Ok(())
    }

    /// Station stops that make `target` reachable from the current position.
    ///
    /// Prefers the single reachable station with the smallest detour from
    /// which `target` is reachable on a full charge. Otherwise returns the
    /// shortest chain of stations, each hop driven on a full charge. A chain
    /// never repeats a station.
    fn station_chain(&self, target: usize) -> Option<Vec<usize>> {
        let problem = self.eval.problem;
        let full = self.vehicle.max_range();
        let candidates = problem.compatible_stations(self.vehicle.vehicle_type());
        let nodes: Vec<usize> = candidates.iter().map(|&s| problem.station_node(s)).collect();
        let reachable =
            |i: usize| nodes[i] != self.node && self.need(self.node, nodes[i]) <= self.range + EPS;

        let single = (0..nodes.len())
            .filter(|&i| reachable(i) && self.need(nodes[i], target) <= full + EPS)
            .min_by(|&a, &b| {
                self.detour(nodes[a], target)
                    .total_cmp(&self.detour(nodes[b], target))
            });
        if let Some(i) = single {
            return Some(vec![candidates[i]]);
        }

        // Dijkstra over stations.
        let n = nodes.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];
        let mut done = vec![false; n];
        for i in (0..n).filter(|&i| reachable(i)) {
            dist[i] = problem.distance(self.node, nodes[i]);
        }
        let mut best: Option<(f64, usize)> = None;
        while let Some(u) = (0..n)
            .filter(|&i| !done[i] && dist[i].is_finite())
            .min_by(|&a, &b| dist[a].total_cmp(&dist[b]))
        {
            done[u] = true;
            if self.need(nodes[u], target) <= full + EPS {
                let total = dist[u] + problem.distance(nodes[u], target);
                if best.map_or(true, |(b, _)| total < b) {
                    best = Some((total, u));
                }
            }
            for v in 0..n {
                if done[v] || nodes[v] == self.node || self.need(nodes[u], nodes[v]) > full + EPS {
                    continue;
                }
                let alt = dist[u] + problem.distance(nodes[u], nodes[v]);
                if alt < dist[v] {
                    dist[v] = alt;
                    prev[v] = Some(u);
                }
            }
        }

        let (_, mut u) = best?;
        let mut chain = vec![candidates[u]];
        while let Some(p) = prev[u] {
            chain.push(candidates[p]);
            u = p;
        }
        chain.reverse();
        Some(chain)
    }

    fn detour(&self, via: usize, target: usize) -> f64 {
        let problem = self.eval.problem;
        problem.distance(self.node, via) + problem.distance(via, target)
    }

    /// Refuels before `customer` if arriving there would strand the vehicle.
    fn look_ahead(&mut self, customer: usize, next: usize) -> Result<(), GvrpError> {
        let need = self.need(self.node, customer);
        if need > self.range + EPS {
            return Ok(());
        }
        if self.can_continue(customer, next, self.range - need) {
            return Ok(());
        }
        let problem = self.eval.problem;
        let full = self.vehicle.max_range();
        let best = problem
            .compatible_stations(self.vehicle.vehicle_type())
            .iter()
            .map(|&s| (s, problem.station_node(s)))
            .filter(|&(_, n)| {
                n != self.node
                    && self.need(self.node, n) <= self.range + EPS
                    && self.need(n, customer) <= full + EPS
                    && self.can_continue(customer, next, full - self.need(n, customer))
            })
            .min_by(|a, b| self.detour(a.1, customer).total_cmp(&self.detour(b.1, customer)));
        if let Some((s, n)) = best {
            self.travel(n);
            self.replenish(s)?;
        }
        Ok(())
    }

    /// Whether, standing at `node` with `range` left, the vehicle can reach
    /// `next` or some compatible station.
    fn can_continue(&self, node: usize, next: usize, range: f64) -> bool {
        if self.need(node, next) <= range + EPS {
            return true;
        }
        // Consumption grows with distance, so the nearest station decides.
        let problem = self.eval.problem;
        problem
            .nearest_station(node, self.vehicle.vehicle_type())
            .is_some_and(|s| self.need(node, problem.station_node(s)) <= range + EPS)
    }

    fn finish(self) -> RouteEvaluation {
        RouteEvaluation {
            vehicle_id: self.vehicle.id(),
            stops: self.stops,
            visits: self.visits,
            distance: self.distance,
            emissions: self.emissions,
            travel_time: self.travel_time,
            replenish_time: self.replenish_time,
            load: self.load,
            slack: RouteSlack {
                capacity: self.vehicle.capacity() - self.load,
                final_range: self.range,
                min_range: self.min_range,
            },
            violations: self.violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Depot, LocationId, Station, StationKind, VehicleType};
    use crate::resource::LinearResourceModel;

    fn line_problem(range: f64, stations: Vec<Station>) -> GvrpProblem {
        GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            vec![Customer::new(1, 10.0, 0.0, 5), Customer::new(2, 4.0, 0.0, 3)],
            stations,
            vec![
                Vehicle::new(0, VehicleType::Electric, 10, range).with_recharge_rate(0.5),
                Vehicle::new(1, VehicleType::Fossil, 10, range),
            ],
        )
        .expect("valid")
    }

    #[test]
    fn test_feasible_route_timeline() {
        let p = line_problem(100.0, vec![]);
        let ev = RouteEvaluator::new(&p, &LinearResourceModel, EvaluationMode::CheckOnly);
        let r = ev
            .evaluate(0, &[Stop::Customer(2), Stop::Customer(1)])
            .expect("known ids");
        assert!(r.is_feasible());
        assert!((r.distance - 20.0).abs() < 1e-10);
        assert_eq!(r.load, 8);
        assert_eq!(r.slack.capacity, 2);
        assert!((r.slack.final_range - 80.0).abs() < 1e-10);
        assert!((r.slack.min_range - 80.0).abs() < 1e-10);
        assert!((r.visits[1].arrival_time - 10.0).abs() < 1e-10);
        assert_eq!(r.visits[1].load_after, 8);
    }

    #[test]
    fn test_empty_route_is_free() {
        let p = line_problem(10.0, vec![]);
        let ev = RouteEvaluator::new(&p, &LinearResourceModel, EvaluationMode::Repair);
        let r = ev.evaluate(0, &[]).expect("known");
        assert!(r.is_feasible());
        assert_eq!(r.distance, 0.0);
        assert!(r.stops.is_empty());
    }

    #[test]
    fn test_check_only_records_range_violation() {
        let p = line_problem(15.0, vec![]);
        let ev = RouteEvaluator::new(&p, &LinearResourceModel, EvaluationMode::CheckOnly);
        let r = ev.evaluate(0, &[Stop::Customer(1)]).expect("known");
        assert!(!r.is_feasible());
        assert!(matches!(
            r.violations[0].kind,
            ViolationType::RangeExceeded {
                from: LocationId::Customer(1),
                to: LocationId::Depot(0),
                ..
            }
        ));
    }

    #[test]
    fn test_repair_inserts_station_and_charges_time() {
        let p = line_problem(12.0, vec![Station::new(0, 10.0, 0.0, StationKind::Standard)]);
        let ev = RouteEvaluator::new(&p, &LinearResourceModel, EvaluationMode::Repair);
        let r = ev.evaluate(0, &[Stop::Customer(1)]).expect("known");
        assert!(r.is_feasible(), "{:?}", r.violations);
        assert_eq!(r.stops, vec![Stop::Customer(1), Stop::Station(0)]);
        assert!((r.distance - 20.0).abs() < 1e-10);
        // arrives with 2 left, refills 10 at 0.5 time/unit
        assert!((r.replenish_time - 5.0).abs() < 1e-10);
        assert!((r.total_time() - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_repair_chains_stations() {
        let p = line_problem(
            6.0,
            vec![
                Station::new(0, 5.0, 0.0, StationKind::Standard),
                Station::new(1, 10.0, 0.0, StationKind::Standard),
            ],
        );
        let ev = RouteEvaluator::new(&p, &LinearResourceModel, EvaluationMode::Repair);
        let r = ev.evaluate(0, &[Stop::Customer(1)]).expect("known");
        assert!(r.is_feasible(), "{:?}", r.violations);
        assert!(r.slack.min_range >= 0.0);
        assert!(r.station_visits() >= 2);
    }

    #[test]
    fn test_repair_ignores_incompatible_stations() {
        let p = line_problem(12.0, vec![Station::new(0, 10.0, 0.0, StationKind::Standard)]);
        let ev = RouteEvaluator::new(&p, &LinearResourceModel, EvaluationMode::Repair);
        let r = ev.evaluate(1, &[Stop::Customer(1)]).expect("known");
        assert!(!r.is_feasible());
        assert!(r.stops.iter().all(|s| !s.is_station()));
    }

    #[test]
    fn test_explicit_incompatible_station_reported() {
        let p = line_problem(100.0, vec![Station::new(3, 2.0, 0.0, StationKind::Fuel)]);
        let ev = RouteEvaluator::new(&p, &LinearResourceModel, EvaluationMode::CheckOnly);
        let r = ev
            .evaluate(0, &[Stop::Station(3), Stop::Customer(2)])
            .expect("known");
        assert!(r
            .violations
            .iter()
            .any(|v| v.kind == ViolationType::IncompatibleStation { vehicle_id: 0, station_id: 3 }));
        assert_eq!(r.replenish_time, 0.0);
    }

    #[test]
    fn test_capacity_violation_reported_once() {
        let p = GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            vec![
                Customer::new(1, 1.0, 0.0, 6),
                Customer::new(2, 2.0, 0.0, 6),
                Customer::new(3, 3.0, 0.0, 6),
            ],
            vec![],
            vec![Vehicle::new(0, VehicleType::Fossil, 10, 100.0)],
        )
        .expect("valid");
        let ev = RouteEvaluator::new(&p, &LinearResourceModel, EvaluationMode::Repair);
        let r = ev
            .evaluate(0, &[Stop::Customer(1), Stop::Customer(2), Stop::Customer(3)])
            .expect("known");
        let overloads: Vec<_> = r
            .violations
            .iter()
            .filter(|v| matches!(v.kind, ViolationType::CapacityExceeded { .. }))
            .collect();
        assert_eq!(overloads.len(), 1);
        assert!(matches!(
            overloads[0].kind,
            ViolationType::CapacityExceeded { customer_id: 2, load: 12, .. }
        ));
    }

    #[test]
    fn test_look_ahead_refuels_before_dead_end() {
        // Driving straight to the customer leaves 2 units, short of both
        // the depot and the station 4 units back.
        let p = GvrpProblem::new(
            vec![Depot::new(0, 0.0, 0.0)],
            vec![Customer::new(1, 8.0, 0.0, 1)],
            vec![Station::new(0, 4.0, 0.0, StationKind::Standard)],
            vec![Vehicle::new(0, VehicleType::Electric, 10, 10.0)],
        )
        .expect("valid");
        let ev = RouteEvaluator::new(&p, &LinearResourceModel, EvaluationMode::Repair);
        let r = ev.evaluate(0, &[Stop::Customer(1)]).expect("known");
        assert!(r.is_feasible(), "{:?}", r.violations);
        assert_eq!(
            r.stops,
            vec![Stop::Station(0), Stop::Customer(1), Stop::Station(0)]
        );
    }

    #[test]
    fn test_repair_is_idempotent() {
        let p = line_problem(
            6.0,
            vec![
                Station::new(0, 5.0, 0.0, StationKind::Standard),
                Station::new(1, 10.0, 0.0, StationKind::Standard),
            ],
        );
        let ev = RouteEvaluator::new(&p, &LinearResourceModel, EvaluationMode::Repair);
        let first = ev
            .evaluate(0, &[Stop::Customer(2), Stop::Customer(1)])
            .expect("known");
        let second = ev.evaluate(0, &first.stops).expect("known");
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let p = line_problem(10.0, vec![]);
        let ev = RouteEvaluator::new(&p, &LinearResourceModel, EvaluationMode::Repair);
        assert!(ev.evaluate(9, &[]).is_err());
        assert!(ev.evaluate(0, &[Stop::Customer(42)]).is_err());
        assert!(ev.evaluate(0, &[Stop::Station(0)]).is_err());
    }
}
