//! Seed destinations used when no dataset file is configured.

use crate::catalog::DatasetEntry;

/// Minimal set of built-in destinations that guarantee the game
/// is playable (six-way choices included) without an import.
pub fn seed_destinations() -> Vec<DatasetEntry> {
  vec![
    entry(
      "Paris", "France",
      &["This city is home to a famous tower that was once considered an eyesore.", "A river called the Seine flows through its center.", "Its metro system opened in 1900."],
      &["The city has only one stop sign.", "The Louvre is the most visited art museum in the world."],
      &["Paris was originally a Roman city called Lutetia.", "The Eiffel Tower grows about 15 cm in summer heat."],
    ),
    entry(
      "Tokyo", "Japan",
      &["This city hosts the busiest pedestrian crossing on Earth.", "It was once a fishing village named Edo.", "It hosted the Summer Olympics twice."],
      &["Its metro area is the most populous in the world.", "Vending machines here outnumber people in some districts."],
      &["Tokyo has more Michelin-starred restaurants than any other city.", "Train delays of five minutes come with an official apology slip."],
    ),
    entry(
      "New York", "USA",
      &["A green lady holding a torch greets visitors to its harbor.", "Its central park is bigger than the principality of Monaco.", "It was briefly the first capital of its country."],
      &["Over 800 languages are spoken here.", "The city was once called New Amsterdam."],
      &["Its subway runs 24 hours a day.", "The Empire State Building has its own zip code."],
    ),
    entry(
      "Rome", "Italy",
      &["This city contains an entire independent country within it.", "Legend says it was founded by twins raised by a wolf.", "Its ancient amphitheater could hold 50,000 spectators."],
      &["About 3,000 euros in coins are tossed into the Trevi Fountain each day.", "It has more than 900 churches."],
      &["Rome had a population of a million people over 2,000 years ago.", "Cats are legally protected at the Largo di Torre Argentina."],
    ),
    entry(
      "Cairo", "Egypt",
      &["This city sits near the last surviving ancient wonder of the world.", "It lies on the banks of the world's longest river.", "Its name means 'The Victorious'."],
      &["Its university Al-Azhar is one of the oldest in the world.", "The city's metro was the first in Africa."],
      &["The Great Pyramid was the tallest man-made structure for 3,800 years.", "Cairo is often called the city of a thousand minarets."],
    ),
    entry(
      "Sydney", "Australia",
      &["Its opera house roof looks like a set of sails.", "A steel arch bridge nicknamed 'The Coathanger' spans its harbor.", "It hosted the Summer Olympics in 2000."],
      &["Its harbor holds more water than 500,000 Olympic pools.", "Bondi Beach is one of the world's most famous beaches."],
      &["The Sydney Opera House took 14 years to build.", "Sydney is not the capital of its country."],
    ),
    entry(
      "Rio de Janeiro", "Brazil",
      &["A giant statue with open arms overlooks this city.", "It hosts one of the world's biggest carnival celebrations.", "A famous beach here shares its name with a song about a girl."],
      &["It was once the capital of the Portuguese empire.", "Its Maracanã stadium once held nearly 200,000 fans."],
      &["Rio's name means 'River of January'.", "The city was the first in South America to host the Olympics."],
    ),
    entry(
      "Cape Town", "South Africa",
      &["A flat-topped mountain looms over this city.", "Two oceans are said to meet near its southern cape.", "A famous prison island lies off its coast."],
      &["Its botanical garden was the first established to preserve indigenous flora.", "Penguins live on a beach just outside the city."],
      &["Table Mountain is one of the oldest mountains in the world.", "The city's nickname is the Mother City."],
    ),
    entry(
      "Reykjavik", "Iceland",
      &["This is the northernmost capital of a sovereign state.", "Geothermal water heats most of its homes.", "Northern lights can sometimes be seen from its streets."],
      &["There are no mosquitoes in the country around it.", "Its main church looks like basalt columns."],
      &["Beer was banned in the country until 1989.", "The city name means 'Smoky Bay'."],
    ),
    entry(
      "Bangkok", "Thailand",
      &["This city's full ceremonial name is the longest place name in the world.", "Floating markets are a classic sight here.", "It is home to a temple of the reclining Buddha."],
      &["It is one of the world's most visited cities.", "Its canals once earned it the nickname 'Venice of the East'."],
      &["The reclining Buddha at Wat Pho is 46 meters long.", "Locals call the city Krung Thep."],
    ),
  ]
}

fn entry(city: &str, country: &str, clues: &[&str], fun_fact: &[&str], trivia: &[&str]) -> DatasetEntry {
  let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
  DatasetEntry {
    city: city.into(),
    country: country.into(),
    clues: owned(clues),
    fun_fact: owned(fun_fact),
    trivia: owned(trivia),
  }
}
