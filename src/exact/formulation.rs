//! Per-vehicle arc formulation of the GVRP.
//!
//! For every vehicle `k` the graph holds its depot, the customers whose
//! demand fits its capacity, and its compatible stations. Variables:
//!
//! - `x[k][i][j]` binary arc, omitted when the arc is longer than the range
//! - `u[k][i]` visit order (MTZ subtour elimination)
//! - `l[k][i]` load delivered after leaving `i`
//! - `y[k][i]` range on arrival at `i`, reset to full after the depot or a
//!   station
//! - `a[k][s]` amount replenished at station `s`
//!
//! The objective is the weighted distance, emissions and time of the linear
//! resource model, so a decoded plan evaluates to the same value.

use tracing::debug;

use super::model::{MilpModel, Sense, VarId};
use crate::error::GvrpError;
use crate::evaluation::ObjectiveWeights;
use crate::models::{GvrpProblem, Route, Solution, Stop};
use crate::resource::effective_speed;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Depot,
    Customer(usize),
    Station(usize),
}

struct Node {
    role: Role,
    matrix: usize,
    order: Option<VarId>,
    load: Option<VarId>,
    range: Option<VarId>,
}

struct Arc {
    from: usize,
    to: usize,
    var: VarId,
}

/// Graph and variables of one vehicle. `nodes[0]` is the depot.
struct VehicleBlock {
    vehicle: usize,
    nodes: Vec<Node>,
    arcs: Vec<Arc>,
}

impl VehicleBlock {
    fn incoming(&self, node: usize) -> Vec<(VarId, f64)> {
        self.arcs
            .iter()
            .filter(|a| a.to == node)
            .map(|a| (a.var, 1.0))
            .collect()
    }

    fn outgoing(&self, node: usize) -> Vec<(VarId, f64)> {
        self.arcs
            .iter()
            .filter(|a| a.from == node)
            .map(|a| (a.var, 1.0))
            .collect()
    }
}

pub(crate) struct Formulation {
    pub model: MilpModel,
    blocks: Vec<VehicleBlock>,
}

impl Formulation {
    pub fn build(problem: &GvrpProblem, weights: ObjectiveWeights) -> Result<Self, GvrpError> {
        let mut model = MilpModel::new();
        let mut blocks = Vec::with_capacity(problem.num_vehicles());
        for k in 0..problem.num_vehicles() {
            blocks.push(vehicle_block(&mut model, problem, weights, k));
        }

        for (ci, customer) in problem.customers().iter().enumerate() {
            let mut terms = Vec::new();
            for block in &blocks {
                if let Some(node) = block.nodes.iter().position(|n| n.role == Role::Customer(ci)) {
                    terms.extend(block.incoming(node));
                }
            }
            if terms.is_empty() {
                return Err(GvrpError::InfeasibleModel {
                    reason: format!("customer {} cannot be reached by any vehicle", customer.id()),
                });
            }
            model.add_constraint(terms, Sense::Eq, 1.0);
        }

        debug!(
            vars = model.num_vars(),
            binaries = model.num_binaries(),
            constraints = model.constraints().len(),
            "Built MILP"
        );
        Ok(Self { model, blocks })
    }

    /// Turns arc values into routes, one per vehicle that leaves its depot.
    pub fn decode(&self, problem: &GvrpProblem, values: &[f64]) -> Result<Solution, GvrpError> {
        let mut solution = Solution::new();
        for block in &self.blocks {
            let mut next = vec![None; block.nodes.len()];
            for arc in &block.arcs {
                if values[arc.var.index()] > 0.5 {
                    next[arc.from] = Some(arc.to);
                }
            }
            let Some(mut node) = next[0] else {
                continue;
            };
            let vehicle_id = problem.vehicles()[block.vehicle].id();
            let mut route = Route::new(vehicle_id);
            let mut steps = 0;
            while node != 0 {
                steps += 1;
                if steps > block.nodes.len() {
                    return Err(GvrpError::Backend(format!(
                        "solution for vehicle {vehicle_id} does not return to its depot"
                    )));
                }
                match block.nodes[node].role {
                    Role::Customer(ci) => route.push(Stop::Customer(problem.customers()[ci].id())),
                    Role::Station(si) => route.push(Stop::Station(problem.stations()[si].id())),
                    Role::Depot => {}
                }
                node = next[node].ok_or_else(|| {
                    GvrpError::Backend(format!(
                        "solution for vehicle {vehicle_id} breaks off mid-route"
                    ))
                })?;
            }
            solution.add_route(route);
        }
        Ok(solution)
    }
}

fn vehicle_block(
    model: &mut MilpModel,
    problem: &GvrpProblem,
    weights: ObjectiveWeights,
    k: usize,
) -> VehicleBlock {
    let vehicle = &problem.vehicles()[k];
    let range = vehicle.max_range();
    let capacity = f64::from(vehicle.capacity());

    let mut roles = vec![Role::Depot];
    roles.extend(
        problem
            .customers()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.demand() <= vehicle.capacity())
            .map(|(ci, _)| Role::Customer(ci)),
    );
    roles.extend(
        problem
            .compatible_stations(vehicle.vehicle_type())
            .iter()
            .map(|&si| Role::Station(si)),
    );
    let n = (roles.len() - 1) as f64;

    let nodes: Vec<Node> = roles
        .into_iter()
        .map(|role| {
            let (matrix, demand) = match role {
                Role::Depot => (problem.vehicle_depot_node(k), 0.0),
                Role::Customer(ci) => (
                    problem.customer_node(ci),
                    f64::from(problem.customers()[ci].demand()),
                ),
                Role::Station(si) => (problem.station_node(si), 0.0),
            };
            if role == Role::Depot {
                return Node {
                    role,
                    matrix,
                    order: None,
                    load: None,
                    range: None,
                };
            }
            let tag = format!("{k}_{matrix}");
            Node {
                role,
                matrix,
                order: Some(model.add_continuous(format!("u_{tag}"), 1.0, n)),
                load: Some(model.add_continuous(format!("l_{tag}"), demand, capacity)),
                range: Some(model.add_continuous(format!("y_{tag}"), 0.0, range)),
            }
        })
        .collect();

    let per_distance = weights.distance
        + weights.emissions * vehicle.emission_rate()
        + weights.time / vehicle.speed();
    let mut arcs = Vec::new();
    for (i, from) in nodes.iter().enumerate() {
        for (j, to) in nodes.iter().enumerate() {
            if i == j {
                continue;
            }
            let d = problem.distance(from.matrix, to.matrix);
            if d > range + EPS {
                continue;
            }
            let var = model.add_binary(format!("x_{k}_{}_{}", from.matrix, to.matrix));
            model.add_objective_term(var, per_distance * d);
            arcs.push(Arc { from: i, to: j, var });
        }
    }
    let block = VehicleBlock {
        vehicle: k,
        nodes,
        arcs,
    };

    // Depot: at most one tour, which must come back.
    let out = block.outgoing(0);
    model.add_constraint(out.clone(), Sense::Le, 1.0);
    let mut balance = block.incoming(0);
    balance.extend(out.into_iter().map(|(v, c)| (v, -c)));
    model.add_constraint(balance, Sense::Eq, 0.0);

    for (j, node) in block.nodes.iter().enumerate().skip(1) {
        let incoming = block.incoming(j);
        let mut balance = incoming.clone();
        balance.extend(block.outgoing(j).into_iter().map(|(v, c)| (v, -c)));
        model.add_constraint(balance, Sense::Eq, 0.0);

        if let Role::Station(si) = node.role {
            model.add_constraint(incoming.clone(), Sense::Le, 1.0);

            // a_s >= R * visited - y_s
            let station = &problem.stations()[si];
            let amount = model.add_continuous(format!("a_{k}_{}", node.matrix), 0.0, range);
            let speed = effective_speed(vehicle, station);
            model.add_objective_term(amount, weights.time * vehicle.recharge_rate() / speed);
            let mut terms = vec![(amount, 1.0)];
            terms.extend(node.range.map(|y| (y, 1.0)));
            terms.extend(incoming.into_iter().map(|(v, _)| (v, -range)));
            model.add_constraint(terms, Sense::Ge, 0.0);
        }
    }

    for arc in &block.arcs {
        let from = &block.nodes[arc.from];
        let to = &block.nodes[arc.to];
        let d = problem.distance(from.matrix, to.matrix);
        let x = arc.var;

        if let (Some(ui), Some(uj)) = (from.order, to.order) {
            model.add_constraint(vec![(ui, 1.0), (uj, -1.0), (x, n)], Sense::Le, n - 1.0);
        }

        if let (Some(li), Some(lj)) = (from.load, to.load) {
            let demand = match to.role {
                Role::Customer(ci) => f64::from(problem.customers()[ci].demand()),
                _ => 0.0,
            };
            model.add_constraint(
                vec![(li, 1.0), (lj, -1.0), (x, capacity)],
                Sense::Le,
                capacity - demand,
            );
        }

        match (from.role, to.range) {
            // Full range after the depot or a station.
            (Role::Depot | Role::Station(_), Some(yj)) => {
                model.add_constraint(vec![(yj, 1.0), (x, d)], Sense::Le, range);
            }
            (Role::Customer(_), Some(yj)) => {
                if let Some(yi) = from.range {
                    model.add_constraint(
                        vec![(yj, 1.0), (yi, -1.0), (x, d + range)],
                        Sense::Le,
                        range,
                    );
                }
            }
            (Role::Customer(_), None) => {
                if let Some(yi) = from.range {
                    model.add_constraint(vec![(yi, 1.0), (x, -d)], Sense::Ge, 0.0);
                }
            }
            (_, None) => {}
        }
    }

    block
}
