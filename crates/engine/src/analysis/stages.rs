//! The six analyst stages of the crew pipeline, run in order.

use super::{AnalysisInputs, AnalysisVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Requirements,
    MarketResearch,
    Legal,
    Valuation,
    Negotiation,
    Inspection,
}

/// Execution order. Each stage sees the output of those before it.
pub const STAGES: [Stage; 6] = [
    Stage::Requirements,
    Stage::MarketResearch,
    Stage::Legal,
    Stage::Valuation,
    Stage::Negotiation,
    Stage::Inspection,
];

/// Search tools a stage may consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchTools {
    pub serper: bool,
    pub brave: bool,
}

impl Stage {
    pub fn key(self) -> &'static str {
        match self {
            Self::Requirements => "collect_car_buying_requirements",
            Self::MarketResearch => "research_vehicle_market",
            Self::Legal => "analyze_legal_requirements",
            Self::Valuation => "evaluate_vehicle_values",
            Self::Negotiation => "develop_negotiation_strategies",
            Self::Inspection => "create_inspection_plan",
        }
    }

    pub fn role(self) -> &'static str {
        match self {
            Self::Requirements => "Car Buying Requirements Analyst",
            Self::MarketResearch => "Car Market Research Specialist",
            Self::Legal => "Interstate Car Purchase Legal Advisor",
            Self::Valuation => "Vehicle Valuation Expert",
            Self::Negotiation => "Car Purchase Negotiation Strategist",
            Self::Inspection => "Vehicle Inspection Coordinator",
        }
    }

    fn goal(self) -> &'static str {
        match self {
            Self::Requirements => {
                "Turn the buyer's free-form needs into a precise, prioritized buying profile."
            }
            Self::MarketResearch => {
                "Find the best currently listed used vehicles matching the buyer's profile and budget."
            }
            Self::Legal => {
                "Explain what a buyer must do to register and title a vehicle bought in another state."
            }
            Self::Valuation => {
                "Judge whether each shortlisted vehicle is fairly priced against market value."
            }
            Self::Negotiation => {
                "Give the buyer concrete tactics and price targets for every shortlisted vehicle."
            }
            Self::Inspection => {
                "Plan the pre-purchase inspection and close with a clear final recommendation."
            }
        }
    }

    /// Tools available to this stage under `variant`.
    pub fn search_tools(self, variant: AnalysisVariant) -> SearchTools {
        match (variant, self) {
            (AnalysisVariant::Full, Self::MarketResearch) => SearchTools {
                serper: true,
                brave: true,
            },
            (AnalysisVariant::Full, Self::Legal | Self::Valuation | Self::Negotiation) => {
                SearchTools {
                    serper: true,
                    brave: false,
                }
            }
            (AnalysisVariant::Reduced, Self::MarketResearch) => SearchTools {
                serper: false,
                brave: true,
            },
            _ => SearchTools::default(),
        }
    }

    /// Web query used when the stage has search tools.
    pub fn search_query(self, inputs: &AnalysisInputs) -> String {
        match self {
            Self::MarketResearch => format!(
                "used {} for sale {} {}",
                inputs.car_type, inputs.budget_range, inputs.current_state
            ),
            Self::Legal => format!(
                "register out of state car purchase in {} requirements",
                inputs.current_state
            ),
            Self::Valuation => format!("{} market value {}", inputs.car_type, inputs.budget_range),
            Self::Negotiation => format!("how to negotiate used {} price", inputs.car_type),
            Self::Requirements | Self::Inspection => {
                format!("{} buying guide", inputs.car_type)
            }
        }
    }

    pub fn system_prompt(self, inputs: &AnalysisInputs) -> String {
        format!(
            "You are the {role}. {goal}\nToday's date is {date}. Be specific and practical.",
            role = self.role(),
            goal = self.goal(),
            date = inputs.current_date,
        )
    }

    fn instructions(self, inputs: &AnalysisInputs) -> String {
        match self {
            Self::Requirements => format!(
                "Analyze these requirements and summarize the buyer's profile: preferred color, \
                 acceptable mileage, must-have and nice-to-have features, payment method, \
                 intended use, purchase timeline and special considerations. Note anything \
                 missing.\nRequirements: {}",
                inputs.user_requirements
            ),
            Self::MarketResearch => format!(
                "Research the used {car_type} market for a buyer in {state} with a budget of \
                 {budget}, searching nearby states as well. Under the heading \
                 \"Top 10 Recommended Vehicles\" give a table with the columns \
                 | Vehicle Model | Price | Mileage | Location | Seller Type | Link |. \
                 Then, under \"Detailed Reasons to Buy Each Vehicle\", justify each pick.",
                car_type = inputs.car_type,
                state = inputs.current_state,
                budget = inputs.budget_range,
            ),
            Self::Legal => format!(
                "Under the heading \"Out-of-State Registration\", explain the title transfer, \
                 registration, sales tax, emissions and inspection rules a {state} resident \
                 faces when buying each recommended vehicle in another state.",
                state = inputs.current_state,
            ),
            Self::Valuation => format!(
                "Compare each recommended vehicle's asking price with its market value for a \
                 buyer with a budget of {budget}. Flag overpriced listings and explain the \
                 total cost of ownership.",
                budget = inputs.budget_range,
            ),
            Self::Negotiation => "Under the heading \"Negotiation Strategies\", give an opening \
                 offer, a walk-away price and seller-specific tactics for each recommended \
                 vehicle, covering dealers and private sellers."
                .to_string(),
            Self::Inspection => format!(
                "Under the heading \"Inspection Checklists\", write a pre-purchase inspection \
                 plan for a {car_type}, including history reports and a mechanic visit. End \
                 with a \"Final Recommendations\" section naming the best choice for the buyer.",
                car_type = inputs.car_type,
            ),
        }
    }

    /// User message: the stage task, prior stage output, and search context.
    pub fn user_prompt(self, inputs: &AnalysisInputs, prior: &str, search_context: &str) -> String {
        let mut prompt = format!(
            "Buyer details:\n\
             - Requirements: {requirements}\n\
             - Vehicle type: {car_type}\n\
             - Budget: {budget}\n\
             - Home state: {state}\n\n\
             Task:\n{task}\n",
            requirements = inputs.user_requirements,
            car_type = inputs.car_type,
            budget = inputs.budget_range,
            state = inputs.current_state,
            task = self.instructions(inputs),
        );

        if !prior.trim().is_empty() {
            prompt.push_str("\nFindings from earlier analysts:\n");
            prompt.push_str(prior);
            prompt.push('\n');
        }
        if search_context.trim().is_empty() {
            prompt.push_str("\nNo live search results are available; rely on your own knowledge.\n");
        } else {
            prompt.push('\n');
            prompt.push_str(search_context);
        }

        prompt
    }
}
